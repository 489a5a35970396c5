//! Plugin manager: the registry plus the session's hook lifecycle.

use tracing::{info, warn};

use vlock_core::config::PluginConfig;

use crate::error::PluginResult;
use crate::hooks::dispatcher::HookDispatcher;
use crate::ordering;
use crate::plugin::Plugin;
use crate::registry::PluginRegistry;
use crate::resolver;

/// Owns the loaded plugins for the lifetime of the locker.
#[derive(Debug)]
pub struct PluginManager {
    /// Loaded plugins.
    registry: PluginRegistry,
    /// Hook dispatcher.
    dispatcher: HookDispatcher,
    /// Whether `vlock_start` completed, so `vlock_end` is owed.
    started: bool,
}

impl PluginManager {
    /// Creates a manager over an empty registry.
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            dispatcher: HookDispatcher::new(),
            started: false,
        }
    }

    /// Creates a manager with the module and script variants.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(PluginRegistry::from_config(config))
    }

    /// Loads a requested plugin.
    pub async fn load(&mut self, identifier: &str) -> PluginResult<()> {
        self.registry.load(identifier).await.map(|_| ())
    }

    /// Resolves dependencies and sorts the plugins into dispatch order.
    pub async fn resolve(&mut self) -> PluginResult<()> {
        resolver::resolve(&mut self.registry).await?;
        ordering::sort(&mut self.registry)?;

        info!(plugins = ?self.registry.names(), "Plugins ready");
        Ok(())
    }

    /// Dispatches `vlock_start`. On failure the started plugins have
    /// already been ended again.
    pub async fn start(&mut self) -> PluginResult<()> {
        self.dispatcher.start(self.registry.plugins_mut()).await?;
        self.started = true;
        Ok(())
    }

    /// Dispatches `vlock_end` if the plugins were started.
    pub async fn end(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        self.dispatcher.end(self.registry.plugins_mut()).await;
    }

    /// Dispatches `vlock_save`.
    pub async fn save(&mut self) {
        self.dispatcher.save(self.registry.plugins_mut()).await;
    }

    /// Dispatches `vlock_save_abort`.
    pub async fn save_abort(&mut self) {
        self.dispatcher.save_abort(self.registry.plugins_mut()).await;
    }

    /// Ends the session if needed and unloads every plugin.
    pub async fn shutdown(&mut self) {
        self.end().await;
        if !self.registry.is_empty() {
            self.registry.unload_all().await;
        }
    }

    /// Plugins in dispatch order.
    pub fn plugins(&self) -> &[Plugin] {
        self.registry.plugins()
    }

    /// Whether any plugin is loaded.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Whether `vlock_start` has completed and `vlock_end` is still owed.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        if self.started {
            warn!("Plugin manager dropped without ending started plugins");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{Dependencies, DependencyKind};
    use crate::hooks::definitions::Hook;
    use crate::plugin::PluginLoader;
    use crate::testing::{HookLog, MemoryLoader};

    fn manager(loader: MemoryLoader) -> PluginManager {
        PluginManager::new(PluginRegistry::new(vec![
            Box::new(loader) as Box<dyn PluginLoader>
        ]))
    }

    #[tokio::test]
    async fn full_lifecycle_follows_dispatch_order() {
        let log = HookLog::new();
        let mut manager = manager(
            MemoryLoader::new(log.clone())
                .plugin("a", Dependencies::new().with(DependencyKind::Precedes, ["b"]))
                .plugin("b", Dependencies::new().with(DependencyKind::Succeeds, ["c"]))
                .plugin("c", Dependencies::new()),
        );

        for name in ["b", "a", "c"] {
            manager.load(name).await.expect("load");
        }
        manager.resolve().await.expect("resolve");
        manager.start().await.expect("start");
        assert!(manager.is_started());

        manager.save().await;
        manager.save_abort().await;
        manager.shutdown().await;

        let order = log.calls_to(Hook::Start);
        let b = order.iter().position(|n| n == "b").expect("b started");
        assert!(order.iter().position(|n| n == "a").expect("a started") < b);
        assert!(order.iter().position(|n| n == "c").expect("c started") < b);

        let mut reversed = order.clone();
        reversed.reverse();
        assert_eq!(log.calls_to(Hook::End), reversed);
        assert_eq!(log.calls_to(Hook::Save), order);
        assert_eq!(log.calls_to(Hook::SaveAbort), reversed);
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn end_is_sent_once() {
        let log = HookLog::new();
        let mut manager = manager(MemoryLoader::new(log.clone()).plugin("a", Dependencies::new()));

        manager.load("a").await.expect("load");
        manager.resolve().await.expect("resolve");
        manager.start().await.expect("start");
        manager.end().await;
        manager.shutdown().await;

        assert_eq!(log.calls_to(Hook::End), ["a"]);
    }

    #[tokio::test]
    async fn failed_start_owes_no_end() {
        let log = HookLog::new();
        let mut manager = manager(
            MemoryLoader::new(log.clone())
                .failing_plugin("a", Dependencies::new(), &[Hook::Start]),
        );

        manager.load("a").await.expect("load");
        manager.resolve().await.expect("resolve");
        assert!(manager.start().await.is_err());
        manager.shutdown().await;

        assert!(log.calls_to(Hook::End).is_empty());
    }
}
