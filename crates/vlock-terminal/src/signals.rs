//! Signal dispositions for the lock process.
//!
//! With `ISIG` cleared the keyboard cannot generate signals, so any of the
//! termination signals arriving here came from another process. They end
//! the lock after cleanup; the process then dies from the same signal.

use std::ffi::CStr;

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tokio::signal::unix::{self as unix_signal, SignalKind};
use tracing::{debug, info};

use crate::error::TerminalResult;

const TERMINATION_BLURB: &str = "\n\
*******************************************************************************\n\
*** vlock caught a fatal signal and will now terminate.  The reason for     ***\n\
*** this is very likely an error in the program.  Please report this        ***\n\
*** problem and include all messages leading up to this one and as much     ***\n\
*** information as possible about your system and configuration.            ***\n\
*** Sorry for any inconvenience.                                            ***\n\
*******************************************************************************\n\
\n";

/// Ignores `SIGTSTP` so the locker cannot be suspended.
pub fn ignore_stop_signal() -> TerminalResult<()> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty());
    // SAFETY: installs SIG_IGN, no handler code runs.
    unsafe { signal::sigaction(Signal::SIGTSTP, &action) }?;
    debug!("SIGTSTP ignored");
    Ok(())
}

/// Listener for `SIGINT`, `SIGQUIT`, `SIGTERM` and `SIGHUP`.
#[derive(Debug)]
pub struct TerminationSignals {
    interrupt: unix_signal::Signal,
    quit: unix_signal::Signal,
    terminate: unix_signal::Signal,
    hangup: unix_signal::Signal,
}

impl TerminationSignals {
    /// Starts listening. Must be called inside a tokio runtime.
    pub fn new() -> TerminalResult<Self> {
        Ok(Self {
            interrupt: unix_signal::signal(SignalKind::interrupt())?,
            quit: unix_signal::signal(SignalKind::quit())?,
            terminate: unix_signal::signal(SignalKind::terminate())?,
            hangup: unix_signal::signal(SignalKind::hangup())?,
        })
    }

    /// Waits for the next termination signal.
    pub async fn recv(&mut self) -> Signal {
        let received = tokio::select! {
            Some(()) = self.interrupt.recv() => Signal::SIGINT,
            Some(()) = self.quit.recv() => Signal::SIGQUIT,
            Some(()) = self.terminate.recv() => Signal::SIGTERM,
            Some(()) = self.hangup.recv() => Signal::SIGHUP,
            else => std::future::pending().await,
        };
        info!(signal = %received, "Termination signal received");
        received
    }
}

/// What to print after being killed by `signal`.
pub fn termination_message(signal: Signal) -> String {
    let mut message = format!(
        "vlock: Killed by signal {} ({})!\n",
        signal as i32,
        describe(signal)
    );
    if signal != Signal::SIGTERM {
        message.push_str(TERMINATION_BLURB);
    }
    message
}

/// Restores the default disposition of `signal` and raises it again.
pub fn reraise(signal: Signal) -> TerminalResult<()> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    // SAFETY: installs SIG_DFL, no handler code runs.
    unsafe { signal::sigaction(signal, &action) }?;
    signal::raise(signal)?;
    Ok(())
}

fn describe(signal: Signal) -> String {
    // SAFETY: strsignal returns a valid string or null; it is copied
    // immediately.
    let text = unsafe { libc::strsignal(signal as i32) };
    if text.is_null() {
        return signal.as_str().to_string();
    }
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sigterm_message_has_no_blurb() {
        let message = termination_message(Signal::SIGTERM);

        assert!(message.starts_with("vlock: Killed by signal 15 ("));
        assert!(message.ends_with(")!\n"));
        assert!(!message.contains("fatal signal"));
    }

    #[test]
    fn other_signals_append_the_blurb() {
        let message = termination_message(Signal::SIGHUP);

        assert!(message.starts_with("vlock: Killed by signal 1 ("));
        assert!(message.contains("vlock caught a fatal signal"));
    }

    #[tokio::test]
    async fn receives_hangup() {
        let mut signals = TerminationSignals::new().expect("listen");

        signal::raise(Signal::SIGHUP).expect("raise");
        let received = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .expect("signal delivered");

        assert_eq!(received, Signal::SIGHUP);
    }
}
