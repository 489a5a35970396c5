//! Application configuration schemas.
//!
//! Two sources are merged into [`AppConfig`]: the root-owned system file
//! (plugin directories, authentication pacing, logging) and the `VLOCK_*`
//! environment of the locking user (messages and timeouts). Plugin
//! directories are never read from the environment: the locker may run
//! with elevated privileges.

pub mod auth;
pub mod lock;
pub mod logging;
pub mod plugin;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::auth::AuthConfig;
pub use self::lock::{LockConfig, parse_seconds};
pub use self::logging::LoggingConfig;
pub use self::plugin::PluginConfig;

use crate::result::AppResult;

/// Location of the system configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/vlock/vlock.toml";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Plugin discovery settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Authentication loop pacing.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-session settings taken from the environment.
    #[serde(skip)]
    pub lock: LockConfig,
}

impl AppConfig {
    /// Load the system file at `path` (if present) and the process
    /// environment.
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut config = Self::from_file(path)?;
        config.lock = LockConfig::from_env()?;
        Ok(config)
    }

    /// Load only the file-backed sections. A missing file yields defaults.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        debug!(path = %path.display(), "Loading configuration file");

        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
