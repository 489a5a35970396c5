//! Convenience result type alias for vlock.

use crate::error::AppError;

/// A specialized `Result` type for vlock operations.
pub type AppResult<T> = Result<T, AppError>;
