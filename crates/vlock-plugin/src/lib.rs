//! # vlock-plugin
//!
//! Plugin framework for vlock. Provides:
//!
//! - A generic directed graph with a residual-reporting topological sort
//! - The plugin contract and its two variants: loadable modules and
//!   executable scripts
//! - A registry that loads plugins by name with variant fallback
//! - Dependency resolution (`requires`, `needs`, `depends`, `conflicts`)
//! - Ordering by `succeeds` / `precedes`
//! - Hook dispatch with rollback on failed start and latching of failed saves
//! - FFI definitions and macros for module authors

pub mod dependency;
pub mod error;
pub mod ffi;
pub mod graph;
pub mod hooks;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod ordering;
pub mod plugin;
pub mod prelude;
pub mod registry;
pub mod resolver;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use dependency::{Dependencies, DependencyKind};
pub use error::{PluginError, PluginResult};
pub use hooks::definitions::Hook;
pub use hooks::dispatcher::HookDispatcher;
pub use loader::{ModuleLoader, ScriptLoader};
pub use manager::PluginManager;
pub use plugin::{Plugin, PluginBackend, PluginLoader};
pub use registry::PluginRegistry;
