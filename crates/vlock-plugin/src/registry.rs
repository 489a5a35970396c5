//! Plugin registry: owns loaded plugins and the loaders that open them.

use std::collections::HashMap;

use tracing::{debug, info};

use vlock_core::config::PluginConfig;

use crate::error::{PluginError, PluginResult};
use crate::loader::{ModuleLoader, ScriptLoader};
use crate::plugin::{Plugin, PluginLoader, plugin_name};

/// Ordered collection of loaded plugins.
///
/// Plugins are kept in load order until [`crate::ordering::sort`] replaces
/// it with the dispatch order. Names are unique at all times.
#[derive(Debug)]
pub struct PluginRegistry {
    /// Variants in preference order.
    loaders: Vec<Box<dyn PluginLoader>>,
    /// Loaded plugins.
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    /// Creates an empty registry trying `loaders` in the given order.
    pub fn new(loaders: Vec<Box<dyn PluginLoader>>) -> Self {
        Self {
            loaders,
            plugins: Vec::new(),
        }
    }

    /// Creates a registry preferring modules over scripts.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(vec![
            Box::new(ModuleLoader::new(config.module_dir())),
            Box::new(ScriptLoader::from_config(config)),
        ])
    }

    /// Loads a plugin unless one of that name is already present.
    ///
    /// Variants are tried in preference order. A variant reporting
    /// not-found passes the name on to the next one; any other failure is
    /// returned as is. Returns the plugin's position in the registry.
    pub async fn load(&mut self, identifier: &str) -> PluginResult<usize> {
        let name = plugin_name(identifier)?;

        if let Some(index) = self.position(&name) {
            return Ok(index);
        }

        let mut last_miss = None;

        for loader in &self.loaders {
            match loader.open(&name).await {
                Ok(plugin) => {
                    info!(
                        plugin = %name,
                        variant = loader.variant(),
                        "Plugin loaded"
                    );
                    self.plugins.push(plugin);
                    return Ok(self.plugins.len() - 1);
                }
                Err(e) if e.is_not_found() => {
                    debug!(
                        plugin = %name,
                        variant = loader.variant(),
                        error = ?e,
                        "Variant does not provide plugin"
                    );
                    last_miss = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_miss.unwrap_or_else(|| PluginError::not_found(name, "no plugin variants configured")))
    }

    /// Looks up a plugin by name.
    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Position of the named plugin.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }

    /// Whether a plugin of this name is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Plugins in their current order.
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Mutable access for hook dispatch.
    pub fn plugins_mut(&mut self) -> &mut [Plugin] {
        &mut self.plugins
    }

    /// Names in their current order.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Removes and returns the plugin at `index`.
    pub(crate) fn remove(&mut self, index: usize) -> Plugin {
        self.plugins.remove(index)
    }

    /// Rearranges the plugins to follow `order`, which must name every
    /// loaded plugin exactly once.
    pub(crate) fn reorder(&mut self, order: &[String]) {
        let mut by_name: HashMap<String, Plugin> = std::mem::take(&mut self.plugins)
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        self.plugins = order.iter().filter_map(|name| by_name.remove(name)).collect();

        // Anything the order did not mention keeps a place at the end.
        self.plugins.extend(by_name.into_values());
    }

    /// Closes and drops every plugin.
    pub async fn unload_all(&mut self) {
        for plugin in self.plugins.drain(..) {
            debug!(plugin = %plugin.name(), "Unloading plugin");
            plugin.close().await;
        }
    }
}
