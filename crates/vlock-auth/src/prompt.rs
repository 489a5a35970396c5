//! The masked password prompt.

use std::io::Write;
use std::sync::atomic::{Ordering, compiler_fence};
use std::time::Duration;

use crate::error::{AuthError, AuthResult};
use crate::input::KeyInput;

/// Longest accepted line, excluding the newline.
pub const MAX_LINE: usize = 511;

/// Bytes that are wiped when dropped.
#[derive(Default)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// The secret's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was entered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }
}

impl From<&[u8]> for Secret {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret({} bytes)", self.0.len())
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
        compiler_fence(Ordering::SeqCst);
    }
}

/// Prints `prompt` to stderr and reads one line without echo.
///
/// Input typed before the prompt appeared is discarded. Reading stops at
/// a newline or after [`MAX_LINE`] bytes; `timeout` applies to every
/// single key.
pub async fn read_masked_line(
    input: &mut dyn KeyInput,
    prompt: &str,
    timeout: Option<Duration>,
) -> AuthResult<Secret> {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(prompt.as_bytes());
    let _ = stderr.flush();

    input.begin_masked();
    input.discard_pending();
    let line = read_line(input, timeout).await;
    input.end_masked();

    if line.is_ok() {
        let _ = writeln!(stderr);
    }

    line
}

async fn read_line(input: &mut dyn KeyInput, timeout: Option<Duration>) -> AuthResult<Secret> {
    let mut line = Secret::default();

    while line.len() < MAX_LINE {
        match input.read_key(timeout).await? {
            None => return Err(AuthError::Timeout),
            Some(b'\n') => break,
            Some(key) => line.push(key),
        }
    }

    Ok(line)
}
