//! # vlock-session
//!
//! The loop that keeps a console locked: wait for a key, run the save
//! hooks when the user walks away, and ask for a password until one is
//! accepted.

pub mod report;
pub mod session;
pub mod settings;

pub use report::{AUTH_FAILURE_BLURB, tries_message};
pub use session::{LockSession, candidate_users};
pub use settings::SessionSettings;
