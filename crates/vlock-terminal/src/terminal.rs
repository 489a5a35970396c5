//! Disabling echo and keyboard-generated signals while locked.

use std::io::{self, IsTerminal};
use std::os::fd::{AsFd, OwnedFd};

use nix::sys::termios::{LocalFlags, SetArg, tcgetattr, tcsetattr};
use tracing::{debug, warn};

use crate::error::{TerminalError, TerminalResult};

/// A terminal with `ECHO` and `ISIG` switched off.
///
/// The original local flags come back on [`SecureTerminal::restore`] or
/// when the guard is dropped, whichever happens first.
#[derive(Debug)]
pub struct SecureTerminal {
    tty: OwnedFd,
    saved: Option<LocalFlags>,
}

impl SecureTerminal {
    /// Secures the terminal on stdin.
    pub fn acquire() -> TerminalResult<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Self::acquire_on(fd)
    }

    /// Secures the terminal behind `tty`.
    pub fn acquire_on(tty: OwnedFd) -> TerminalResult<Self> {
        if !tty.is_terminal() {
            return Err(TerminalError::NotATerminal);
        }

        let mut termios = tcgetattr(&tty)?;
        let saved = termios.local_flags;
        termios
            .local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ISIG);
        tcsetattr(&tty, SetArg::TCSANOW, &termios)?;

        debug!("Terminal secured");
        Ok(Self {
            tty,
            saved: Some(saved),
        })
    }

    /// Puts the original local flags back. Later calls do nothing.
    pub fn restore(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };

        let result = tcgetattr(&self.tty).and_then(|mut termios| {
            termios.local_flags = saved;
            tcsetattr(&self.tty, SetArg::TCSANOW, &termios)
        });

        match result {
            Ok(()) => debug!("Terminal restored"),
            Err(e) => warn!(error = %e, "Failed to restore terminal"),
        }
    }
}

impl Drop for SecureTerminal {
    fn drop(&mut self) {
        self.restore();
    }
}
