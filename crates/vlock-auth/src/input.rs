//! Key-at-a-time input with timeouts.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::AsFd;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::termios::{FlushArg, LocalFlags, SetArg, Termios, tcflush, tcgetattr, tcsetattr};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::debug;

use crate::error::AuthResult;

/// A source of single key presses.
#[async_trait]
pub trait KeyInput: Send {
    /// Reads one byte. Returns `None` once `timeout` elapses without input.
    async fn read_key(&mut self, timeout: Option<Duration>) -> AuthResult<Option<u8>>;

    /// Drops anything typed ahead of a prompt.
    fn discard_pending(&mut self) {}

    /// Stops echoing typed characters until [`KeyInput::end_masked`].
    fn begin_masked(&mut self) {}

    /// Restores echoing as it was before [`KeyInput::begin_masked`].
    fn end_masked(&mut self) {}
}

/// Waits for a key from `accept` (any key when `None`). Other keys are
/// ignored and restart the timeout. Returns `None` on timeout.
pub async fn wait_for_key(
    input: &mut dyn KeyInput,
    accept: Option<&[u8]>,
    timeout: Option<Duration>,
) -> AuthResult<Option<u8>> {
    loop {
        match input.read_key(timeout).await? {
            None => return Ok(None),
            Some(key) if accept.is_none_or(|set| set.contains(&key)) => return Ok(Some(key)),
            Some(key) => debug!(key, "Ignoring key"),
        }
    }
}

/// Reads keys from the controlling terminal on stdin.
#[derive(Debug)]
pub struct TerminalInput {
    tty: AsyncFd<File>,
    /// Local flags saved by [`KeyInput::begin_masked`].
    masked: Option<LocalFlags>,
}

impl TerminalInput {
    /// Wraps a duplicate of stdin. Stdin must be a terminal.
    pub fn stdin() -> io::Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        let tty = AsyncFd::with_interest(File::from(fd), Interest::READABLE)?;
        Ok(Self { tty, masked: None })
    }

    async fn read_byte(&self) -> io::Result<u8> {
        loop {
            let mut ready = self.tty.readable().await?;
            let mut byte = [0u8; 1];

            let result = ready.try_io(|inner| {
                let mut file = inner.get_ref();
                file.read(&mut byte)
            });

            match result {
                Ok(Ok(0)) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
                Ok(Ok(_)) => return Ok(byte[0]),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
    }
}

#[async_trait]
impl KeyInput for TerminalInput {
    async fn read_key(&mut self, timeout: Option<Duration>) -> AuthResult<Option<u8>> {
        // Keys arrive one by one rather than a line at a time.
        let _raw = LocalFlagsGuard::clear(self.tty.get_ref(), LocalFlags::ICANON);

        let key = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.read_byte()).await {
                Ok(byte) => Some(byte?),
                Err(_) => None,
            },
            None => Some(self.read_byte().await?),
        };

        Ok(key)
    }

    fn discard_pending(&mut self) {
        let _ = tcflush(self.tty.get_ref(), FlushArg::TCIFLUSH);
    }

    fn begin_masked(&mut self) {
        let Ok(mut termios) = tcgetattr(self.tty.get_ref()) else {
            return;
        };
        self.masked = Some(termios.local_flags);
        termios.local_flags.remove(LocalFlags::ECHO);
        let _ = tcsetattr(self.tty.get_ref(), SetArg::TCSAFLUSH, &termios);
    }

    fn end_masked(&mut self) {
        let Some(flags) = self.masked.take() else {
            return;
        };
        if let Ok(mut termios) = tcgetattr(self.tty.get_ref()) {
            termios.local_flags = flags;
            let _ = tcsetattr(self.tty.get_ref(), SetArg::TCSAFLUSH, &termios);
        }
    }
}

/// Clears local flags for as long as it lives.
struct LocalFlagsGuard<'a> {
    tty: &'a File,
    saved: Option<Termios>,
}

impl<'a> LocalFlagsGuard<'a> {
    fn clear(tty: &'a File, flags: LocalFlags) -> Self {
        let saved = tcgetattr(tty).ok();
        if let Some(original) = &saved {
            let mut changed = original.clone();
            changed.local_flags.remove(flags);
            let _ = tcsetattr(tty, SetArg::TCSANOW, &changed);
        }
        Self { tty, saved }
    }
}

impl Drop for LocalFlagsGuard<'_> {
    fn drop(&mut self) {
        if let Some(original) = &self.saved {
            let _ = tcsetattr(self.tty, SetArg::TCSANOW, original);
        }
    }
}
