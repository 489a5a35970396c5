//! One-shot teardown shared by every exit path.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

type Action = Box<dyn FnOnce() + Send>;

/// Actions run in reverse registration order, at most once.
///
/// Normal exit, a termination signal and a panic may all reach
/// [`CleanupStack::run`]; only the first caller does the work.
#[derive(Default)]
pub struct CleanupStack {
    actions: Mutex<Vec<(&'static str, Action)>>,
    done: AtomicBool,
}

impl CleanupStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action`. After the stack has run, the action runs
    /// immediately instead.
    pub fn push(&self, name: &'static str, action: impl FnOnce() + Send + 'static) {
        if self.done.load(Ordering::SeqCst) {
            warn!(name, "Cleanup already ran, running action now");
            action();
            return;
        }

        match self.actions.lock() {
            Ok(mut actions) => actions.push((name, Box::new(action))),
            Err(poisoned) => poisoned.into_inner().push((name, Box::new(action))),
        }
    }

    /// Runs every registered action, newest first. Returns `false` if the
    /// stack had already run.
    pub fn run(&self) -> bool {
        if self.done.swap(true, Ordering::SeqCst) {
            return false;
        }

        let actions = match self.actions.lock() {
            Ok(mut actions) => std::mem::take(&mut *actions),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        for (name, action) in actions.into_iter().rev() {
            debug!(name, "Running cleanup");
            action();
        }

        true
    }

    /// Whether [`CleanupStack::run`] has been called.
    pub fn has_run(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.actions.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupStack")
            .field("pending", &self.len())
            .field("done", &self.has_run())
            .finish()
    }
}
