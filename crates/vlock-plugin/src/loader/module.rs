//! Loadable module variant (`<module_dir>/<name>.so`), feature-gated on
//! `dynamic`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nix::errno::Errno;
use nix::unistd::{AccessFlags, access};

use crate::error::{PluginError, PluginResult};
use crate::plugin::{Plugin, PluginLoader};

/// Opens plugins from shared libraries in one directory.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    /// Directory holding the modules.
    directory: PathBuf,
}

impl ModuleLoader {
    /// Creates a loader for `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Where the module called `name` would live.
    pub fn module_path(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{name}.{}", std::env::consts::DLL_EXTENSION))
    }
}

/// Checks read access with the real user's credentials, so a privileged
/// locker never opens a module its caller could not read.
fn check_access(name: &str, path: &Path) -> PluginResult<()> {
    match access(path, AccessFlags::R_OK) {
        Ok(()) => Ok(()),
        Err(Errno::ENOENT) => Err(PluginError::not_found(
            name,
            format!("{}: {}", path.display(), Errno::ENOENT.desc()),
        )),
        Err(errno) => Err(PluginError::failed(
            name,
            format!("{}: {}", path.display(), errno.desc()),
        )),
    }
}

#[async_trait]
impl PluginLoader for ModuleLoader {
    fn variant(&self) -> &'static str {
        "module"
    }

    async fn open(&self, name: &str) -> PluginResult<Plugin> {
        let path = self.module_path(name);
        check_access(name, &path)?;
        dynamic::open(name, &path)
    }
}

#[cfg(feature = "dynamic")]
mod dynamic {
    use std::ffi::c_void;
    use std::os::raw::c_char;
    use std::path::Path;
    use std::ptr;

    use async_trait::async_trait;
    use libloading::os::unix::{Library, RTLD_LOCAL, RTLD_NOW};
    use tracing::{debug, info};

    use crate::dependency::{Dependencies, DependencyKind};
    use crate::error::{PluginError, PluginResult};
    use crate::ffi::abi::HookFn;
    use crate::ffi::safety::read_string_table;
    use crate::hooks::definitions::Hook;
    use crate::plugin::{Plugin, PluginBackend};

    /// Opaque per-plugin pointer handed to every hook call.
    #[derive(Debug)]
    struct HookContext(*mut c_void);

    // The context is only touched from the thread dispatching hooks, and
    // only through `&mut` access to the owning backend.
    unsafe impl Send for HookContext {}

    /// An opened module.
    #[derive(Debug)]
    struct ModuleBackend {
        name: String,
        /// Entry points, indexed by hook.
        hooks: [Option<HookFn>; 4],
        context: HookContext,
        /// Keeps the code behind `hooks` mapped; dropped last.
        _library: Library,
    }

    pub(super) fn open(name: &str, path: &Path) -> PluginResult<Plugin> {
        // SAFETY: loading runs the module's initializers. Modules come from
        // the root-owned module directory only.
        let library = unsafe { Library::open(Some(path), RTLD_NOW | RTLD_LOCAL) }
            .map_err(|e| PluginError::failed(name, format!("could not open module: {e}")))?;

        let mut hooks = [None; 4];
        for hook in Hook::ALL {
            // SAFETY: the ABI fixes the signature of every hook symbol.
            hooks[hook.index()] = unsafe { library.get::<HookFn>(hook.symbol()) }
                .ok()
                .map(|symbol| *symbol);
        }

        let mut dependencies = Dependencies::new();
        for kind in DependencyKind::ALL {
            // SAFETY: dependency symbols are null-terminated pointer arrays;
            // the symbol's address is the address of the first element.
            let names = match unsafe { library.get::<*const *const c_char>(kind.symbol()) } {
                Ok(table) => unsafe { read_string_table(*table) },
                Err(_) => Vec::new(),
            };
            dependencies.set(kind, names);
        }

        info!(
            plugin = %name,
            path = %path.display(),
            hooks = hooks.iter().filter(|h| h.is_some()).count(),
            "Module opened"
        );

        let backend = ModuleBackend {
            name: name.to_string(),
            hooks,
            context: HookContext(ptr::null_mut()),
            _library: library,
        };

        Ok(Plugin::new(name, dependencies, Box::new(backend)))
    }

    #[async_trait]
    impl PluginBackend for ModuleBackend {
        fn variant(&self) -> &'static str {
            "module"
        }

        async fn call_hook(&mut self, hook: Hook) -> bool {
            let Some(entry) = self.hooks[hook.index()] else {
                return true;
            };

            debug!(plugin = %self.name, hook = %hook, "Calling module hook");

            // SAFETY: the library outlives the call and the context pointer
            // is owned by this plugin instance.
            unsafe { entry(&mut self.context.0) }
        }
    }
}

#[cfg(not(feature = "dynamic"))]
mod dynamic {
    use std::path::Path;

    use crate::error::{PluginError, PluginResult};
    use crate::plugin::Plugin;

    /// Without dynamic loading no module can be provided.
    pub(super) fn open(name: &str, path: &Path) -> PluginResult<Plugin> {
        Err(PluginError::not_found(
            name,
            format!("{}: module support is disabled", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[tokio::test]
    async fn missing_module_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = ModuleLoader::new(dir.path());

        let err = loader.open("absent").await.expect_err("must fail");

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn garbage_module_fails_without_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = ModuleLoader::new(dir.path());
        std::fs::write(loader.module_path("junk"), b"not an ELF object").expect("write");

        let err = loader.open("junk").await.expect_err("must fail");

        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn unreadable_module_fails() {
        if nix::unistd::getuid().is_root() {
            // root passes every access check
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = ModuleLoader::new(dir.path());
        let path = loader.module_path("private");
        std::fs::write(&path, b"").expect("write");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).expect("chmod");

        let err = loader.open("private").await.expect_err("must fail");

        assert!(matches!(err, PluginError::Failed { .. }));
    }

    #[test]
    fn module_path_uses_native_extension() {
        let loader = ModuleLoader::new("/usr/lib/vlock/modules");
        assert_eq!(
            loader.module_path("all"),
            Path::new("/usr/lib/vlock/modules").join(format!(
                "all.{}",
                std::env::consts::DLL_EXTENSION
            ))
        );
    }
}
