//! Per-session settings read from the `VLOCK_*` environment.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Environment prefix for session settings.
pub const ENV_PREFIX: &str = "VLOCK";

/// Settings the locking user controls through the environment.
///
/// Timeouts are kept as raw strings and parsed leniently: anything that is
/// not a positive number of seconds disables the timeout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockConfig {
    /// `VLOCK_MESSAGE`: overrides both message variants.
    #[serde(default)]
    pub message: Option<String>,
    /// `VLOCK_ALL_MESSAGE`: shown when all consoles are locked.
    #[serde(default)]
    pub all_message: Option<String>,
    /// `VLOCK_CURRENT_MESSAGE`: shown when only this console is locked.
    #[serde(default)]
    pub current_message: Option<String>,
    /// `VLOCK_PROMPT_TIMEOUT`: seconds allowed for typing a password.
    #[serde(default)]
    pub prompt_timeout: Option<String>,
    /// `VLOCK_TIMEOUT`: idle seconds before the save hooks run.
    #[serde(default)]
    pub timeout: Option<String>,
    /// `VLOCK_DEBUG`: non-empty enables debug logging.
    #[serde(default)]
    pub debug: Option<String>,
}

impl LockConfig {
    /// Read the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_source(None)
    }

    /// Read from an explicit variable map instead of the process
    /// environment. Keys carry the `VLOCK_` prefix.
    pub fn from_vars(vars: HashMap<String, String>) -> AppResult<Self> {
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<HashMap<String, String>>) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(vars))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// The message to print before waiting for a key, if any.
    pub fn message(&self, all_consoles: bool) -> Option<&str> {
        let variant = if all_consoles {
            self.all_message.as_deref()
        } else {
            self.current_message.as_deref()
        };

        self.message.as_deref().or(variant).filter(|m| !m.is_empty())
    }

    /// Timeout for the password prompt.
    pub fn prompt_timeout(&self) -> Option<Duration> {
        self.prompt_timeout.as_deref().and_then(parse_seconds)
    }

    /// Idle time before the save hooks are triggered.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.timeout.as_deref().and_then(parse_seconds)
    }

    /// Whether debug logging was requested.
    pub fn debug(&self) -> bool {
        self.debug.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Parse a count of seconds. Zero, negative and malformed values mean
/// "no timeout".
pub fn parse_seconds(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(seconds) => Some(Duration::from_secs(seconds)),
    }
}
