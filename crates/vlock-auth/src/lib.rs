//! # vlock-auth
//!
//! Everything needed to ask for and check a password:
//!
//! - [`KeyInput`]: key-at-a-time input with timeouts, backed by the
//!   terminal in production
//! - [`read_masked_line`]: the password prompt
//! - [`Authenticator`]: the backend contract, with a shadow-password
//!   implementation behind the `shadow` feature

pub mod authenticator;
pub mod error;
pub mod input;
pub mod prompt;
#[cfg(feature = "shadow")]
pub mod shadow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use authenticator::Authenticator;
pub use error::{AuthError, AuthResult};
pub use input::{KeyInput, TerminalInput, wait_for_key};
pub use prompt::{Secret, read_masked_line};
#[cfg(feature = "shadow")]
pub use shadow::ShadowAuthenticator;
