//! Timing and message settings for one lock session.

use std::time::Duration;

use vlock_core::config::{AuthConfig, LockConfig};

/// Everything the loop needs to know besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    /// Printed before every wait for a key.
    pub message: Option<String>,
    /// Idle time before the save hooks run. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Per-character limit while typing a password.
    pub prompt_timeout: Option<Duration>,
    /// Pause after every failed attempt.
    pub retry_delay: Duration,
    /// Extra pause after an authentication error.
    pub failure_delay: Duration,
    /// Whether root's password is accepted too.
    pub root_fallback: bool,
}

impl SessionSettings {
    /// Combines environment and system settings.
    pub fn new(lock: &LockConfig, auth: &AuthConfig, all_consoles: bool) -> Self {
        Self {
            message: lock.message(all_consoles).map(str::to_string),
            idle_timeout: lock.idle_timeout(),
            prompt_timeout: lock.prompt_timeout(),
            retry_delay: auth.retry_delay(),
            failure_delay: auth.failure_delay(),
            root_fallback: auth.root_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lock(pairs: &[(&str, &str)]) -> LockConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LockConfig::from_vars(vars).expect("lock config")
    }

    #[test]
    fn picks_message_for_console_scope() {
        let lock = lock(&[
            ("VLOCK_ALL_MESSAGE", "all locked"),
            ("VLOCK_CURRENT_MESSAGE", "this one locked"),
            ("VLOCK_TIMEOUT", "30"),
        ]);
        let auth = AuthConfig::default();

        let all = SessionSettings::new(&lock, &auth, true);
        let current = SessionSettings::new(&lock, &auth, false);

        assert_eq!(all.message.as_deref(), Some("all locked"));
        assert_eq!(current.message.as_deref(), Some("this one locked"));
        assert_eq!(all.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(all.prompt_timeout, None);
    }

    #[test]
    fn delays_come_from_auth_config() {
        let auth = AuthConfig {
            root_fallback: false,
            retry_delay_ms: 10,
            failure_delay_ms: 20,
        };

        let settings = SessionSettings::new(&LockConfig::default(), &auth, false);

        assert_eq!(settings.retry_delay, Duration::from_millis(10));
        assert_eq!(settings.failure_delay, Duration::from_millis(20));
        assert!(!settings.root_fallback);
        assert!(settings.message.is_none());
    }
}
