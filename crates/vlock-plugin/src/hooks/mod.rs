//! Hook definitions and dispatch across the ordered plugin list.

pub mod definitions;
pub mod dispatcher;

pub use definitions::Hook;
pub use dispatcher::HookDispatcher;
