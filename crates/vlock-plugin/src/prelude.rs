//! Everything a loadable module needs.
//!
//! ```rust,ignore
//! use vlock_plugin::prelude::*;
//!
//! declare_dependencies! {
//!     requires: ["all"];
//! }
//!
//! #[unsafe(no_mangle)]
//! pub extern "C" fn vlock_start(_ctx: *mut *mut c_void) -> bool {
//!     true
//! }
//! ```

pub use std::ffi::c_void;

pub use crate::declare_dependencies;
pub use crate::ffi::abi::{DependencyTable, HookFn};
