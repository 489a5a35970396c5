//! Scripted input and authenticators for tests without a terminal.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::authenticator::Authenticator;
use crate::error::{AuthError, AuthResult};
use crate::input::KeyInput;

#[derive(Debug, Clone, Copy)]
enum Step {
    Key(u8),
    Timeout,
    Error,
}

/// Plays back a fixed sequence of keys and timeouts. Running past the end
/// is an end-of-input error.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    steps: VecDeque<Step>,
    /// Number of `begin_masked` calls not yet matched by `end_masked`.
    pub masked_depth: i32,
    /// Number of `discard_pending` calls.
    pub discards: usize,
}

impl ScriptedInput {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends key presses.
    pub fn keys(mut self, keys: &[u8]) -> Self {
        self.steps.extend(keys.iter().map(|k| Step::Key(*k)));
        self
    }

    /// Appends a timeout.
    pub fn timeout(mut self) -> Self {
        self.steps.push_back(Step::Timeout);
        self
    }

    /// Appends a read error.
    pub fn error(mut self) -> Self {
        self.steps.push_back(Step::Error);
        self
    }

    /// Steps not consumed yet.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait]
impl KeyInput for ScriptedInput {
    async fn read_key(&mut self, _timeout: Option<Duration>) -> AuthResult<Option<u8>> {
        match self.steps.pop_front() {
            Some(Step::Key(key)) => Ok(Some(key)),
            Some(Step::Timeout) => Ok(None),
            Some(Step::Error) => Err(AuthError::Input(io::Error::other("scripted read error"))),
            None => Err(AuthError::Input(io::Error::from(io::ErrorKind::UnexpectedEof))),
        }
    }

    fn discard_pending(&mut self) {
        self.discards += 1;
    }

    fn begin_masked(&mut self) {
        self.masked_depth += 1;
    }

    fn end_masked(&mut self) {
        self.masked_depth -= 1;
    }
}

/// Outcome a [`ScriptedAuthenticator`] produces for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The attempt succeeds.
    Accept,
    /// The password is wrong.
    Deny,
    /// The prompt times out.
    Timeout,
    /// The backend fails.
    Fail,
}

/// Authenticator replaying one outcome per attempt and recording which
/// users were asked. Runs out into denials.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAuthenticator {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAuthenticator {
    /// Replays `outcomes` in order.
    pub fn new(outcomes: &[Outcome]) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.iter().copied().collect())),
            attempts: Arc::default(),
        }
    }

    /// Users asked so far, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Authenticator for ScriptedAuthenticator {
    async fn authenticate(
        &self,
        _input: &mut dyn KeyInput,
        user: &str,
        _timeout: Option<Duration>,
    ) -> AuthResult<()> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(user.to_string());
        }

        let outcome = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut o| o.pop_front())
            .unwrap_or(Outcome::Deny);

        match outcome {
            Outcome::Accept => Ok(()),
            Outcome::Deny => Err(AuthError::Denied),
            Outcome::Timeout => Err(AuthError::Timeout),
            Outcome::Fail => Err(AuthError::Failed("Could not get shadow record: EIO".into())),
        }
    }
}
