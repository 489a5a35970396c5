//! Shadow-password backend using `getspnam(3)` and `crypt(3)`.
//!
//! Reading the shadow database requires the locker to run with elevated
//! privileges.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::time::Duration;

use async_trait::async_trait;
use nix::errno::Errno;
use tracing::debug;

use crate::authenticator::Authenticator;
use crate::error::{AuthError, AuthResult};
use crate::input::KeyInput;
use crate::prompt::{Secret, read_masked_line};

#[link(name = "crypt")]
unsafe extern "C" {
    fn crypt(key: *const c_char, salt: *const c_char) -> *mut c_char;
}

/// Verifies passwords against the shadow database.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShadowAuthenticator;

impl ShadowAuthenticator {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for ShadowAuthenticator {
    async fn authenticate(
        &self,
        input: &mut dyn KeyInput,
        user: &str,
        timeout: Option<Duration>,
    ) -> AuthResult<()> {
        let prompt = format!("{user}'s Password: ");
        let password = read_masked_line(input, &prompt, timeout).await?;

        let user = user.to_string();
        tokio::task::spawn_blocking(move || verify(&user, &password))
            .await
            .map_err(|e| AuthError::Failed(format!("password check aborted: {e}")))?
    }
}

/// Compares `password` with the user's shadow hash.
fn verify(user: &str, password: &Secret) -> AuthResult<()> {
    let c_user = CString::new(user).map_err(|_| AuthError::Denied)?;
    let hash = shadow_hash(&c_user)?;

    let Ok(c_password) = CString::new(password.as_bytes()) else {
        return Err(AuthError::Denied);
    };

    // SAFETY: both arguments are valid null-terminated strings; the result
    // points into crypt's static buffer and is copied before returning.
    let computed = unsafe { crypt(c_password.as_ptr(), hash.as_ptr()) };
    let computed_errno = Errno::last();

    let mut wipe = c_password.into_bytes();
    wipe.fill(0);

    if computed.is_null() {
        return Err(AuthError::Failed(format!(
            "crypt() failed: {}",
            computed_errno.desc()
        )));
    }

    // SAFETY: non-null results of crypt are null-terminated strings.
    let matches = unsafe { CStr::from_ptr(computed) } == hash.as_c_str();

    if matches {
        Ok(())
    } else {
        debug!(user, "Password mismatch");
        Err(AuthError::Denied)
    }
}

/// Looks up the user's password hash. An unknown user is a denial; a
/// lookup error is a failure.
fn shadow_hash(user: &CStr) -> AuthResult<CString> {
    Errno::clear();

    // SAFETY: `user` is null-terminated. The returned record lives in
    // static storage until `endspent`, so the hash is copied first.
    let entry = unsafe { libc::getspnam(user.as_ptr()) };
    let lookup_errno = Errno::last_raw();

    let hash = if entry.is_null() {
        None
    } else {
        // SAFETY: a non-null record has a valid `sp_pwdp` string.
        Some(unsafe { CStr::from_ptr((*entry).sp_pwdp) }.to_owned())
    };

    // SAFETY: closes the database opened by getspnam.
    unsafe { libc::endspent() };

    match hash {
        Some(hash) => Ok(hash),
        None if lookup_errno == 0 => Err(AuthError::Denied),
        None => Err(AuthError::Failed(format!(
            "Could not get shadow record: {}",
            Errno::from_raw(lookup_errno).desc()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_never_authenticates() {
        let password = Secret::from(&b"irrelevant"[..]);

        let result = verify("vlock-test-no-such-user", &password);

        assert!(matches!(
            result,
            Err(AuthError::Denied) | Err(AuthError::Failed(_))
        ));
    }

    #[test]
    fn interior_nul_is_denied() {
        let password = Secret::from(&b"irrelevant"[..]);

        assert!(matches!(verify("ro\0ot", &password), Err(AuthError::Denied)));
    }
}
