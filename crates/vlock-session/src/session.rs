//! The authentication loop.

use std::io::{self, Write};
use std::time::Duration;

use tracing::{debug, info, warn};

use vlock_auth::{AuthError, Authenticator, KeyInput, wait_for_key};
use vlock_plugin::PluginManager;

use crate::report::AUTH_FAILURE_BLURB;
use crate::settings::SessionSettings;

const ENTER: u8 = b'\n';
const ESCAPE: u8 = 0x1b;

/// Users whose password unlocks a console locked by `user`.
pub fn candidate_users(user: &str, root_fallback: bool) -> Vec<String> {
    let mut users = vec![user.to_string()];
    if root_fallback && user != "root" {
        users.push("root".to_string());
    }
    users
}

/// One locked console.
///
/// [`LockSession::run`] returns only once a password was accepted. It is
/// safe to drop the future at any await point, e.g. when a termination
/// signal wins a `select!`; the failed-try count stays readable.
pub struct LockSession<'a> {
    plugins: &'a mut PluginManager,
    input: &'a mut dyn KeyInput,
    authenticator: &'a dyn Authenticator,
    users: Vec<String>,
    settings: SessionSettings,
    output: Box<dyn Write + Send>,
    failed_tries: u32,
}

impl<'a> LockSession<'a> {
    /// Creates a session locking the console for `user`.
    pub fn new(
        plugins: &'a mut PluginManager,
        input: &'a mut dyn KeyInput,
        authenticator: &'a dyn Authenticator,
        user: &str,
        settings: SessionSettings,
    ) -> Self {
        let users = candidate_users(user, settings.root_fallback);
        Self {
            plugins,
            input,
            authenticator,
            users,
            settings,
            output: Box::new(io::stderr()),
            failed_tries: 0,
        }
    }

    /// Sends messages somewhere other than stderr.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Rounds in which every candidate user failed.
    pub fn failed_tries(&self) -> u32 {
        self.failed_tries
    }

    /// Runs until some candidate user authenticates.
    pub async fn run(&mut self) {
        loop {
            if let Some(message) = &self.settings.message {
                let _ = writeln!(self.output, "{message}");
            }

            let key = self
                .wait(Some(&[ENTER, ESCAPE][..]), self.settings.idle_timeout)
                .await;

            if key != Some(ENTER) && !self.screen_saver().await {
                continue;
            }

            if self.authenticate_any().await {
                info!(failed_tries = self.failed_tries, "Unlocked");
                return;
            }

            self.failed_tries += 1;
        }
    }

    /// Runs the save hooks until a key is pressed. Returns whether that
    /// key was Enter, which goes straight on to the password prompt.
    async fn screen_saver(&mut self) -> bool {
        debug!("Idle, running save hooks");
        self.plugins.save().await;
        let key = self.wait(None, None).await;
        self.plugins.save_abort().await;
        key == Some(ENTER)
    }

    async fn authenticate_any(&mut self) -> bool {
        for index in 0..self.users.len() {
            let user = &self.users[index];
            let result = self
                .authenticator
                .authenticate(&mut *self.input, user, self.settings.prompt_timeout)
                .await;

            let error = match result {
                Ok(()) => return true,
                Err(error) => error,
            };

            debug!(user = %self.users[index], error = %error, "Authentication attempt failed");
            self.report(&error).await;
            sleep(self.settings.retry_delay).await;
        }

        false
    }

    async fn report(&mut self, error: &AuthError) {
        match error {
            AuthError::Timeout => {
                let _ = writeln!(self.output, "Timeout!");
            }
            AuthError::Failed(_) => {
                let _ = writeln!(self.output, "vlock: {error}");
                let _ = self.output.write_all(AUTH_FAILURE_BLURB.as_bytes());
                sleep(self.settings.failure_delay).await;
            }
            AuthError::Denied | AuthError::Input(_) => {
                let _ = writeln!(self.output, "vlock: {error}");
            }
        }
        let _ = self.output.flush();
    }

    /// Waits for a key. Input errors count as a timeout and are followed
    /// by a pause so a dead terminal does not spin the loop.
    async fn wait(&mut self, accept: Option<&[u8]>, timeout: Option<Duration>) -> Option<u8> {
        match wait_for_key(&mut *self.input, accept, timeout).await {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Reading a key failed");
                sleep(self.settings.retry_delay).await;
                None
            }
        }
    }
}

async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_added_as_fallback() {
        assert_eq!(candidate_users("alice", true), ["alice", "root"]);
    }

    #[test]
    fn root_is_not_asked_twice() {
        assert_eq!(candidate_users("root", true), ["root"]);
    }

    #[test]
    fn fallback_can_be_disabled() {
        assert_eq!(candidate_users("alice", false), ["alice"]);
    }
}
