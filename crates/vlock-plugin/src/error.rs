//! Plugin framework errors.

use thiserror::Error;

use vlock_core::error::{AppError, ErrorKind};

use crate::hooks::definitions::Hook;

/// Errors raised while loading, resolving or starting plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No variant provides a plugin of this name.
    #[error("no such plugin '{name}'")]
    NotFound {
        /// Requested plugin name.
        name: String,
        /// What the last variant tried reported.
        reason: String,
    },

    /// The plugin exists but could not be opened.
    #[error("{reason}")]
    Failed {
        /// Plugin name.
        name: String,
        /// Human-readable failure cause.
        reason: String,
    },

    /// The requested plugin set is inconsistent.
    #[error("{0}")]
    Dependency(String),

    /// A plugin refused to start.
    #[error("plugin '{plugin}' failed")]
    HookFailed {
        /// Plugin whose hook returned failure.
        plugin: String,
        /// The hook that failed.
        hook: Hook,
    },

    /// The identifier does not name a plugin file.
    #[error("invalid plugin name '{0}'")]
    InvalidName(String),
}

impl PluginError {
    /// Construct a not-found error.
    pub fn not_found(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Construct an open failure.
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether another variant may still provide the plugin.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        let kind = match &err {
            PluginError::NotFound { .. } | PluginError::InvalidName(_) => ErrorKind::NotFound,
            PluginError::Failed { .. } | PluginError::HookFailed { .. } => ErrorKind::Plugin,
            PluginError::Dependency(_) => ErrorKind::Dependency,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_failure_names_the_plugin() {
        let err = AppError::from(PluginError::HookFailed {
            plugin: "all".into(),
            hook: Hook::Start,
        });

        assert_eq!(err.kind(), ErrorKind::Plugin);
        assert_eq!(err.message, "plugin 'all' failed");
    }

    #[test]
    fn kinds_follow_the_failure() {
        let missing = AppError::from(PluginError::not_found("nosuch", "not installed"));
        let invalid = AppError::from(PluginError::InvalidName("../x".into()));
        let broken = AppError::from(PluginError::failed("new", "bad ELF header"));
        let conflict = AppError::from(PluginError::Dependency("'a' and 'b' clash".into()));

        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.message, "no such plugin 'nosuch'");
        assert_eq!(invalid.kind(), ErrorKind::NotFound);
        assert_eq!(broken.kind(), ErrorKind::Plugin);
        assert_eq!(broken.message, "bad ELF header");
        assert_eq!(conflict.kind(), ErrorKind::Dependency);
    }
}
