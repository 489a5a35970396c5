//! Authentication errors.

use thiserror::Error;

/// Why an authentication attempt did not succeed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The password was wrong or the user has no usable password.
    #[error("Authentication failure")]
    Denied,

    /// Nothing was typed within the prompt timeout.
    #[error("prompt timed out")]
    Timeout,

    /// The backend could not check the password at all.
    #[error("{0}")]
    Failed(String),

    /// Reading the terminal failed.
    #[error("could not read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
