//! In-memory plugins for exercising the framework without artifacts on disk.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::dependency::Dependencies;
use crate::error::{PluginError, PluginResult};
use crate::hooks::definitions::Hook;
use crate::plugin::{Plugin, PluginBackend, PluginLoader};

/// Shared record of every hook call, in call order.
#[derive(Debug, Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<(String, Hook)>>>);

impl HookLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<(String, Hook)> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Names of the plugins that received `hook`, in call order.
    pub fn calls_to(&self, hook: Hook) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, h)| *h == hook)
            .map(|(name, _)| name)
            .collect()
    }

    fn record(&self, plugin: &str, hook: Hook) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push((plugin.to_string(), hook));
        }
    }
}

#[derive(Debug, Clone)]
struct Definition {
    dependencies: Dependencies,
    failing: HashSet<Hook>,
}

/// A loader serving plugins defined in memory.
#[derive(Debug)]
pub struct MemoryLoader {
    variant: &'static str,
    definitions: HashMap<String, Definition>,
    broken: HashSet<String>,
    log: HookLog,
}

impl MemoryLoader {
    /// Creates a loader that records hook calls into `log`.
    pub fn new(log: HookLog) -> Self {
        Self {
            variant: "memory",
            definitions: HashMap::new(),
            broken: HashSet::new(),
            log,
        }
    }

    /// Overrides the variant label.
    pub fn with_variant(mut self, variant: &'static str) -> Self {
        self.variant = variant;
        self
    }

    /// Defines a plugin whose hooks all succeed.
    pub fn plugin(self, name: &str, dependencies: Dependencies) -> Self {
        self.failing_plugin(name, dependencies, &[])
    }

    /// Defines a plugin whose listed hooks fail.
    pub fn failing_plugin(mut self, name: &str, dependencies: Dependencies, hooks: &[Hook]) -> Self {
        self.definitions.insert(
            name.to_string(),
            Definition {
                dependencies,
                failing: hooks.iter().copied().collect(),
            },
        );
        self
    }

    /// Defines a plugin that exists but cannot be opened.
    pub fn broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }
}

#[async_trait]
impl PluginLoader for MemoryLoader {
    fn variant(&self) -> &'static str {
        self.variant
    }

    async fn open(&self, name: &str) -> PluginResult<Plugin> {
        if self.broken.contains(name) {
            return Err(PluginError::failed(name, format!("{name} is broken")));
        }

        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| PluginError::not_found(name, "not defined in memory"))?;

        let backend = MemoryBackend {
            name: name.to_string(),
            variant: self.variant,
            failing: definition.failing.clone(),
            log: self.log.clone(),
        };

        Ok(Plugin::new(
            name,
            definition.dependencies.clone(),
            Box::new(backend),
        ))
    }
}

#[derive(Debug)]
struct MemoryBackend {
    name: String,
    variant: &'static str,
    failing: HashSet<Hook>,
    log: HookLog,
}

#[async_trait]
impl PluginBackend for MemoryBackend {
    fn variant(&self) -> &'static str {
        self.variant
    }

    async fn call_hook(&mut self, hook: Hook) -> bool {
        self.log.record(&self.name, hook);
        !self.failing.contains(&hook)
    }
}
