//! # vlock-terminal
//!
//! Process-level plumbing around a lock session: putting the terminal into
//! a state where keys cannot generate signals, undoing that exactly once on
//! every exit path, and reporting fatal signals.

pub mod cleanup;
pub mod error;
pub mod signals;
pub mod terminal;

pub use cleanup::CleanupStack;
pub use error::{TerminalError, TerminalResult};
pub use signals::{TerminationSignals, ignore_stop_signal, reraise, termination_message};
pub use terminal::SecureTerminal;
