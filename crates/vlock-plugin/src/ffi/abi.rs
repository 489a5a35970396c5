//! FFI ABI definitions for loadable modules.
//!
//! A module is a shared library that may export, by these exact names:
//!
//! ```c
//! bool vlock_start(void **ctx);
//! bool vlock_end(void **ctx);
//! bool vlock_save(void **ctx);
//! bool vlock_save_abort(void **ctx);
//!
//! const char *succeeds[], *precedes[], *requires[],
//!            *needs[], *depends[], *conflicts[];
//! ```
//!
//! Every export is optional. The context pointer starts out null and is
//! kept by the locker between calls for the module's own use. Dependency
//! arrays are terminated by a null pointer.

use std::ffi::c_void;
use std::os::raw::c_char;

/// Type of every hook entry point.
pub type HookFn = unsafe extern "C" fn(context: *mut *mut c_void) -> bool;

/// A null-terminated array of C strings, laid out exactly like
/// `const char *name[N]`.
#[repr(transparent)]
pub struct DependencyTable<const N: usize>([*const c_char; N]);

// The pointers reference string literals with static lifetime.
unsafe impl<const N: usize> Sync for DependencyTable<N> {}

impl<const N: usize> DependencyTable<N> {
    /// Wraps an array of pointers. The last entry must be null and every
    /// other entry must point at a `'static` null-terminated string.
    pub const fn new(entries: [*const c_char; N]) -> Self {
        Self(entries)
    }

    /// Pointer to the first entry, as a loader sees the exported symbol.
    pub const fn as_ptr(&self) -> *const *const c_char {
        self.0.as_ptr()
    }
}
