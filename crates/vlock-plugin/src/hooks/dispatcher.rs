//! Hook dispatcher: walks the ordered plugin list for each hook.
//!
//! - `vlock_start` runs front to back. The first failure rolls back every
//!   plugin already started with `vlock_end`, newest first, and aborts.
//! - `vlock_end` runs back to front and never fails.
//! - `vlock_save` runs front to back. A plugin failing it is told to
//!   abort and receives no further save hooks.
//! - `vlock_save_abort` runs back to front. A failure disables further
//!   save hooks for that plugin.

use tracing::{debug, error, warn};

use crate::error::{PluginError, PluginResult};
use crate::hooks::definitions::Hook;
use crate::plugin::Plugin;

/// Dispatches hooks over plugins in dispatch order.
#[derive(Debug, Default, Clone, Copy)]
pub struct HookDispatcher;

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Starts every plugin, rolling back on the first failure.
    pub async fn start(&self, plugins: &mut [Plugin]) -> PluginResult<()> {
        debug!(hook = %Hook::Start, plugin_count = plugins.len(), "Dispatching hook");
        for index in 0..plugins.len() {
            if plugins[index].call_hook(Hook::Start).await {
                continue;
            }

            let failed = plugins[index].name().to_string();
            error!(plugin = %failed, started = index, "Plugin failed to start, rolling back");

            self.end(&mut plugins[..index]).await;

            return Err(PluginError::HookFailed {
                plugin: failed,
                hook: Hook::Start,
            });
        }

        Ok(())
    }

    /// Ends every plugin, newest first.
    pub async fn end(&self, plugins: &mut [Plugin]) {
        for plugin in plugins.iter_mut().rev() {
            if !plugin.call_hook(Hook::End).await {
                warn!(plugin = %plugin.name(), hook = %Hook::End, "Hook failed");
            }
        }
    }

    /// Sends `vlock_save` to every plugin still accepting it.
    pub async fn save(&self, plugins: &mut [Plugin]) {
        for plugin in plugins.iter_mut() {
            if plugin.is_save_disabled() {
                continue;
            }

            if !plugin.call_hook(Hook::Save).await {
                warn!(plugin = %plugin.name(), hook = %Hook::Save, "Hook failed, disabling save");
                plugin.disable_save();
                plugin.call_hook(Hook::SaveAbort).await;
            }
        }
    }

    /// Sends `vlock_save_abort` to every plugin still accepting it.
    pub async fn save_abort(&self, plugins: &mut [Plugin]) {
        for plugin in plugins.iter_mut().rev() {
            if plugin.is_save_disabled() {
                continue;
            }

            if !plugin.call_hook(Hook::SaveAbort).await {
                warn!(plugin = %plugin.name(), hook = %Hook::SaveAbort, "Hook failed, disabling save");
                plugin.disable_save();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependencies;
    use crate::plugin::PluginLoader;
    use crate::testing::{HookLog, MemoryLoader};

    async fn open(loader: &MemoryLoader, names: &[&str]) -> Vec<Plugin> {
        let mut plugins = Vec::new();
        for name in names {
            plugins.push(loader.open(name).await.expect("open"));
        }
        plugins
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn start_runs_forward_and_end_backward() {
        let log = HookLog::new();
        let loader = MemoryLoader::new(log.clone())
            .plugin("a", Dependencies::new())
            .plugin("b", Dependencies::new())
            .plugin("c", Dependencies::new());
        let mut plugins = open(&loader, &["a", "b", "c"]).await;
        let dispatcher = HookDispatcher::new();

        dispatcher.start(&mut plugins).await.expect("start");
        dispatcher.end(&mut plugins).await;

        assert_eq!(log.calls_to(Hook::Start), names(&["a", "b", "c"]));
        assert_eq!(log.calls_to(Hook::End), names(&["c", "b", "a"]));
    }

    #[tokio::test]
    async fn failed_start_rolls_back_earlier_plugins_only() {
        let log = HookLog::new();
        let loader = MemoryLoader::new(log.clone())
            .plugin("a", Dependencies::new())
            .plugin("b", Dependencies::new())
            .failing_plugin("c", Dependencies::new(), &[Hook::Start])
            .plugin("d", Dependencies::new());
        let mut plugins = open(&loader, &["a", "b", "c", "d"]).await;

        let err = HookDispatcher::new()
            .start(&mut plugins)
            .await
            .expect_err("start must fail");

        assert!(matches!(
            err,
            PluginError::HookFailed { ref plugin, hook: Hook::Start } if plugin == "c"
        ));
        assert_eq!(log.calls_to(Hook::Start), names(&["a", "b", "c"]));
        assert_eq!(log.calls_to(Hook::End), names(&["b", "a"]));
    }

    #[tokio::test]
    async fn failure_on_first_plugin_ends_nothing() {
        let log = HookLog::new();
        let loader = MemoryLoader::new(log.clone())
            .failing_plugin("a", Dependencies::new(), &[Hook::Start])
            .plugin("b", Dependencies::new());
        let mut plugins = open(&loader, &["a", "b"]).await;

        assert!(HookDispatcher::new().start(&mut plugins).await.is_err());
        assert!(log.calls_to(Hook::End).is_empty());
    }

    #[tokio::test]
    async fn failed_save_is_aborted_once_and_latched() {
        let log = HookLog::new();
        let loader = MemoryLoader::new(log.clone())
            .plugin("a", Dependencies::new())
            .failing_plugin("b", Dependencies::new(), &[Hook::Save]);
        let mut plugins = open(&loader, &["a", "b"]).await;
        let dispatcher = HookDispatcher::new();

        dispatcher.save(&mut plugins).await;
        assert!(plugins[1].is_save_disabled());
        assert_eq!(
            log.calls(),
            vec![
                ("a".to_string(), Hook::Save),
                ("b".to_string(), Hook::Save),
                ("b".to_string(), Hook::SaveAbort),
            ]
        );

        dispatcher.save_abort(&mut plugins).await;
        dispatcher.save(&mut plugins).await;
        dispatcher.save_abort(&mut plugins).await;

        assert_eq!(log.calls_to(Hook::Save), names(&["a", "b", "a"]));
        assert_eq!(log.calls_to(Hook::SaveAbort), names(&["b", "a", "a"]));
    }

    #[tokio::test]
    async fn failed_save_abort_disables_later_saves() {
        let log = HookLog::new();
        let loader = MemoryLoader::new(log.clone())
            .failing_plugin("a", Dependencies::new(), &[Hook::SaveAbort])
            .plugin("b", Dependencies::new());
        let mut plugins = open(&loader, &["a", "b"]).await;
        let dispatcher = HookDispatcher::new();

        dispatcher.save(&mut plugins).await;
        dispatcher.save_abort(&mut plugins).await;
        dispatcher.save(&mut plugins).await;
        dispatcher.save_abort(&mut plugins).await;

        assert_eq!(log.calls_to(Hook::Save), names(&["a", "b", "b"]));
        assert_eq!(log.calls_to(Hook::SaveAbort), names(&["b", "a", "b"]));
    }

    #[tokio::test]
    async fn start_and_end_ignore_the_save_latch() {
        let log = HookLog::new();
        let loader = MemoryLoader::new(log.clone())
            .failing_plugin("a", Dependencies::new(), &[Hook::Save]);
        let mut plugins = open(&loader, &["a"]).await;
        let dispatcher = HookDispatcher::new();

        dispatcher.save(&mut plugins).await;
        dispatcher.start(&mut plugins).await.expect("start");
        dispatcher.end(&mut plugins).await;

        assert_eq!(log.calls_to(Hook::Start), names(&["a"]));
        assert_eq!(log.calls_to(Hook::End), names(&["a"]));
    }
}
