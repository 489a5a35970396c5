//! Executable script variant (`<script_dir>/<name>`).
//!
//! Dependencies are read by running `<name> <relation>` once per relation
//! and splitting its output into names. Hooks go to a single long-lived
//! `<name> hooks` child, one hook name per line on its stdin.

use std::fs::File;
use std::io::{self, Write};
use std::mem;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use vlock_core::config::PluginConfig;

use crate::dependency::{Dependencies, DependencyKind};
use crate::error::{PluginError, PluginResult};
use crate::hooks::definitions::Hook;
use crate::plugin::{Plugin, PluginBackend, PluginLoader};

/// Default deadline for one dependency query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);
/// Default bound on the output of one dependency query.
pub const DEFAULT_MAX_OUTPUT: usize = 2048;
/// Default time a child gets to exit before it is killed.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

/// Why a dependency query failed.
#[derive(Debug, Error)]
enum QueryError {
    #[error("could not run script: {0}")]
    Spawn(#[source] io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("output exceeds {0} bytes")]
    TooLarge(usize),

    #[error("could not read output: {0}")]
    Read(#[source] io::Error),
}

impl QueryError {
    /// The script does not exist or cannot be executed.
    fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::Spawn(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
        )
    }
}

/// Opens plugins from executables in one directory.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    /// Directory holding the scripts.
    directory: PathBuf,
    /// Deadline for each dependency query.
    query_timeout: Duration,
    /// Maximum bytes accepted from a dependency query.
    max_output: usize,
    /// Time a child gets to exit before it is killed.
    grace: Duration,
}

impl ScriptLoader {
    /// Creates a loader for `directory` with default limits.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_output: DEFAULT_MAX_OUTPUT,
            grace: DEFAULT_GRACE,
        }
    }

    /// Creates a loader from the plugin configuration.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(config.script_dir())
            .with_query_timeout(config.dependency_timeout())
            .with_max_output(config.dependency_max_bytes)
            .with_grace(config.teardown_grace())
    }

    /// Overrides the dependency query deadline.
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Overrides the dependency output bound.
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    /// Overrides the grace period before children are killed.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Where the script called `name` would live.
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    /// Runs `<script> <relation>` and returns the names it prints.
    async fn query(&self, path: &Path, kind: DependencyKind) -> Result<Vec<String>, QueryError> {
        let mut child = Command::new(path)
            .arg(kind.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(QueryError::Spawn)?;

        let deadline = Instant::now() + self.query_timeout;
        let output = match child.stdout.take() {
            Some(stdout) => self.read_bounded(stdout, deadline).await,
            None => Ok(Vec::new()),
        };

        reap(&mut child, self.grace, path).await;

        Ok(parse_names(&String::from_utf8_lossy(&output?)))
    }

    /// Reads until EOF, failing on the deadline or once the output grows
    /// past the bound. The pipe is closed on return.
    async fn read_bounded(
        &self,
        mut stdout: ChildStdout,
        deadline: Instant,
    ) -> Result<Vec<u8>, QueryError> {
        let mut output = Vec::new();
        let mut chunk = [0u8; 512];

        loop {
            let read = timeout_at(deadline, stdout.read(&mut chunk))
                .await
                .map_err(|_| QueryError::Timeout(self.query_timeout))?
                .map_err(QueryError::Read)?;

            if read == 0 {
                return Ok(output);
            }
            if output.len() + read > self.max_output {
                return Err(QueryError::TooLarge(self.max_output));
            }
            output.extend_from_slice(&chunk[..read]);
        }
    }
}

#[async_trait]
impl PluginLoader for ScriptLoader {
    fn variant(&self) -> &'static str {
        "script"
    }

    async fn open(&self, name: &str) -> PluginResult<Plugin> {
        let path = self.script_path(name);
        let mut dependencies = Dependencies::new();

        for (position, kind) in DependencyKind::ALL.into_iter().enumerate() {
            match self.query(&path, kind).await {
                Ok(names) => dependencies.set(kind, names),
                // Only the very first launch tells "absent" from "broken".
                Err(e) if position == 0 && e.is_missing() => {
                    return Err(PluginError::not_found(
                        name,
                        format!("{}: {e}", path.display()),
                    ));
                }
                Err(e) => {
                    return Err(PluginError::failed(
                        name,
                        format!("querying '{kind}' from {}: {e}", path.display()),
                    ));
                }
            }
        }

        info!(plugin = %name, path = %path.display(), "Script opened");

        let backend = ScriptBackend {
            name: name.to_string(),
            path,
            grace: self.grace,
            process: HookProcess::Idle,
        };

        Ok(Plugin::new(name, dependencies, Box::new(backend)))
    }
}

/// Splits script output into dependency names.
fn parse_names(output: &str) -> Vec<String> {
    output
        .split(|c| matches!(c, ' ' | '\r' | '\n'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Waits for `child` to exit, killing it once `grace` has passed.
async fn reap(child: &mut Child, grace: Duration, path: &Path) {
    match timeout(grace, child.wait()).await {
        Ok(Ok(status)) => debug!(path = %path.display(), %status, "Script exited"),
        Ok(Err(e)) => warn!(path = %path.display(), error = %e, "Could not wait for script"),
        Err(_) => {
            warn!(path = %path.display(), "Script did not exit in time, killing it");
            if let Err(e) = child.kill().await {
                warn!(path = %path.display(), error = %e, "Could not kill script");
            }
        }
    }
}

/// State of the `<script> hooks` child.
#[derive(Debug)]
enum HookProcess {
    /// Not launched yet.
    Idle,
    /// Accepting hook names on `pipe`.
    Running { child: Child, pipe: File },
    /// Launch or a write failed; the child is kept for reaping.
    Dead { child: Option<Child> },
}

/// An opened script.
#[derive(Debug)]
struct ScriptBackend {
    name: String,
    path: PathBuf,
    grace: Duration,
    process: HookProcess,
}

impl ScriptBackend {
    /// Starts `<script> hooks` with a non-blocking pipe on its stdin.
    fn launch(&self) -> io::Result<(Child, File)> {
        let mut child = Command::new(&self.path)
            .arg("hooks")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("hook process has no stdin"))?;
        let fd = stdin.into_owned_fd()?;
        set_nonblocking(&fd)?;

        Ok((child, File::from(fd)))
    }

    fn mark_dead(&mut self) {
        let child = match mem::replace(&mut self.process, HookProcess::Dead { child: None }) {
            HookProcess::Running { child, pipe } => {
                drop(pipe);
                Some(child)
            }
            HookProcess::Dead { child } => child,
            HookProcess::Idle => None,
        };
        self.process = HookProcess::Dead { child };
    }
}

#[async_trait]
impl PluginBackend for ScriptBackend {
    fn variant(&self) -> &'static str {
        "script"
    }

    async fn call_hook(&mut self, hook: Hook) -> bool {
        if matches!(self.process, HookProcess::Idle) {
            self.process = match self.launch() {
                Ok((child, pipe)) => {
                    debug!(plugin = %self.name, "Hook process launched");
                    HookProcess::Running { child, pipe }
                }
                Err(e) => {
                    warn!(plugin = %self.name, error = %e, "Could not launch hook process");
                    HookProcess::Dead { child: None }
                }
            };
        }

        let HookProcess::Running { pipe, .. } = &mut self.process else {
            return false;
        };

        let line = format!("{hook}\n");
        let written = {
            let _sigpipe = SigpipeGuard::ignore();
            pipe.write(line.as_bytes())
        };

        match written {
            Ok(n) if n == line.len() => true,
            Ok(n) => {
                warn!(plugin = %self.name, hook = %hook, written = n, "Short write to hook process");
                self.mark_dead();
                false
            }
            Err(e) => {
                warn!(plugin = %self.name, hook = %hook, error = %e, "Hook process is gone");
                self.mark_dead();
                false
            }
        }
    }

    async fn close(&mut self) {
        let child = match mem::replace(&mut self.process, HookProcess::Dead { child: None }) {
            HookProcess::Running { child, pipe } => {
                drop(pipe);
                Some(child)
            }
            HookProcess::Dead { child } => child,
            HookProcess::Idle => None,
        };

        if let Some(mut child) = child {
            reap(&mut child, self.grace, &self.path).await;
        }
    }
}

fn set_nonblocking(fd: &impl AsRawFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(raw, FcntlArg::F_GETFL)?);
    fcntl(raw, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Ignores `SIGPIPE` while alive and restores the previous disposition on
/// drop.
struct SigpipeGuard(Option<SigAction>);

impl SigpipeGuard {
    fn ignore() -> Self {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        // SAFETY: SIG_IGN runs no handler code.
        let previous = unsafe { sigaction(Signal::SIGPIPE, &ignore) }.ok();
        Self(previous)
    }
}

impl Drop for SigpipeGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.0.take() {
            // SAFETY: reinstalls exactly what was installed before.
            let _ = unsafe { sigaction(Signal::SIGPIPE, &previous) };
        }
    }
}
