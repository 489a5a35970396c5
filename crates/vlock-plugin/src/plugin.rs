//! The plugin contract shared by every variant.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::dependency::Dependencies;
use crate::error::{PluginError, PluginResult};
use crate::hooks::definitions::Hook;

/// Variant-specific execution state of an opened plugin.
#[async_trait]
pub trait PluginBackend: Send + fmt::Debug {
    /// Short variant label used in logs and listings.
    fn variant(&self) -> &'static str;

    /// Runs the handler for `hook`. A plugin without a handler succeeds.
    async fn call_hook(&mut self, hook: Hook) -> bool;

    /// Releases processes or libraries held by the backend.
    async fn close(&mut self) {}
}

/// Opens plugins of one variant by name.
#[async_trait]
pub trait PluginLoader: Send + Sync + fmt::Debug {
    /// Short variant label.
    fn variant(&self) -> &'static str;

    /// Discovers the plugin called `name` and reads its dependencies.
    ///
    /// Returns [`PluginError::NotFound`] only when no artifact exists, so
    /// that the registry can fall back to the next variant.
    async fn open(&self, name: &str) -> PluginResult<Plugin>;
}

/// A loaded plugin.
#[derive(Debug)]
pub struct Plugin {
    name: String,
    dependencies: Dependencies,
    save_disabled: bool,
    backend: Box<dyn PluginBackend>,
}

impl Plugin {
    /// Wraps an opened backend.
    pub fn new(
        name: impl Into<String>,
        dependencies: Dependencies,
        backend: Box<dyn PluginBackend>,
    ) -> Self {
        Self {
            name: name.into(),
            dependencies,
            save_disabled: false,
            backend,
        }
    }

    /// The plugin's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin's declared relations.
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Variant label of the backend.
    pub fn variant(&self) -> &'static str {
        self.backend.variant()
    }

    /// Whether save hooks are no longer sent to this plugin.
    pub fn is_save_disabled(&self) -> bool {
        self.save_disabled
    }

    /// Stops save hooks for the rest of the session.
    pub fn disable_save(&mut self) {
        self.save_disabled = true;
    }

    /// Runs a hook handler.
    pub async fn call_hook(&mut self, hook: Hook) -> bool {
        self.backend.call_hook(hook).await
    }

    /// Releases the backend's resources.
    pub async fn close(mut self) {
        self.backend.close().await;
    }
}

/// Reduces a caller-supplied identifier to a plugin name.
///
/// Only the final path component is kept so that an identifier can never
/// point outside the plugin directories.
pub fn plugin_name(identifier: &str) -> PluginResult<String> {
    Path::new(identifier)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PluginError::InvalidName(identifier.to_string()))
}
