//! The two plugin variants: loadable modules and executable scripts.

pub mod module;
pub mod script;

pub use module::ModuleLoader;
pub use script::ScriptLoader;
