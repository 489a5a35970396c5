//! The authentication backend contract.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::input::KeyInput;

/// Checks a user's password, prompting for it on `input`.
///
/// Implementations report a wrong password as [`crate::AuthError::Denied`]
/// and leave any delay before the next attempt to the caller.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Prompts for and verifies `user`'s password. `timeout` bounds the
    /// wait for each typed character.
    async fn authenticate(
        &self,
        input: &mut dyn KeyInput,
        user: &str,
        timeout: Option<Duration>,
    ) -> AuthResult<()>;
}
