//! Authentication loop configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pacing and fallback settings for the unlock loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Also accept the root password when the locking user is not root.
    #[serde(default = "default_true")]
    pub root_fallback: bool,
    /// Pause after every authentication attempt, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Additional pause after an authentication error, in milliseconds.
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,
}

impl AuthConfig {
    /// Pause after every attempt.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Pause after an authentication error.
    pub fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.failure_delay_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            root_fallback: default_true(),
            retry_delay_ms: default_retry_delay_ms(),
            failure_delay_ms: default_failure_delay_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_failure_delay_ms() -> u64 {
    3000
}
