//! Terminal and signal errors.

use std::io;

use thiserror::Error;

use vlock_core::error::{AppError, ErrorKind};

/// Errors from terminal setup and signal handling.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The descriptor is not a terminal.
    #[error("stdin is not a terminal")]
    NotATerminal,

    /// Reading or changing terminal attributes failed.
    #[error("terminal attributes: {0}")]
    Termios(#[from] nix::Error),

    /// Signal handling could not be installed.
    #[error("signal handling: {0}")]
    Signal(#[from] io::Error),
}

/// Result alias for terminal operations.
pub type TerminalResult<T> = Result<T, TerminalError>;

impl From<TerminalError> for AppError {
    fn from(err: TerminalError) -> Self {
        let message = err.to_string();
        AppError::with_source(ErrorKind::Terminal, message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_errors_keep_their_message() {
        let err = AppError::from(TerminalError::NotATerminal);

        assert_eq!(err.kind(), ErrorKind::Terminal);
        assert_eq!(err.message, "stdin is not a terminal");
    }

    #[test]
    fn signal_errors_keep_their_source() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "sigaction");
        let err = AppError::from(TerminalError::from(io));

        assert_eq!(err.kind(), ErrorKind::Terminal);
        assert!(err.message.starts_with("signal handling: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
