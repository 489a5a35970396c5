//! Plugin system configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Plugin discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory containing loadable plugin modules (`<name>.so`).
    #[serde(default = "default_module_dir")]
    pub module_dir: String,
    /// Directory containing executable plugin scripts.
    #[serde(default = "default_script_dir")]
    pub script_dir: String,
    /// Deadline for a single script dependency query, in milliseconds.
    #[serde(default = "default_dependency_timeout_ms")]
    pub dependency_timeout_ms: u64,
    /// Upper bound on the output of a single script dependency query.
    #[serde(default = "default_dependency_max_bytes")]
    pub dependency_max_bytes: usize,
    /// Time a script child gets to exit before it is killed, in milliseconds.
    #[serde(default = "default_teardown_grace_ms")]
    pub teardown_grace_ms: u64,
}

impl PluginConfig {
    /// Module directory as a path.
    pub fn module_dir(&self) -> PathBuf {
        PathBuf::from(&self.module_dir)
    }

    /// Script directory as a path.
    pub fn script_dir(&self) -> PathBuf {
        PathBuf::from(&self.script_dir)
    }

    /// Deadline for one dependency query.
    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.dependency_timeout_ms)
    }

    /// Grace period before a script child is killed.
    pub fn teardown_grace(&self) -> Duration {
        Duration::from_millis(self.teardown_grace_ms)
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            module_dir: default_module_dir(),
            script_dir: default_script_dir(),
            dependency_timeout_ms: default_dependency_timeout_ms(),
            dependency_max_bytes: default_dependency_max_bytes(),
            teardown_grace_ms: default_teardown_grace_ms(),
        }
    }
}

fn default_module_dir() -> String {
    "/usr/lib/vlock/modules".to_string()
}

fn default_script_dir() -> String {
    "/usr/lib/vlock/scripts".to_string()
}

fn default_dependency_timeout_ms() -> u64 {
    1000
}

fn default_dependency_max_bytes() -> usize {
    2048
}

fn default_teardown_grace_ms() -> u64 {
    500
}
