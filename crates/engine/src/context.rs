//! Per-run execution context
//!
//! The [`Context`] is handed to every condition, action and plugin. It
//! borrows the configuration and the repository/IO capabilities from the
//! runner and carries the two pieces of run-scoped state: the plugin skip
//! flag and the recursion guard.

use crate::repository::Repository;
use grapnel_core::{HookName, Io, Result};
use grapnel_config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run-scoped guard against re-entrant hook processing
///
/// The working-tree preservation plugin resets the working tree with a
/// `git checkout`, which on a real repository can fire a post-checkout
/// hook. The guard is held around that reset; [`crate::HookRunner::run`]
/// consults it at entry and turns guarded invocations into a no-op.
///
/// The guard is scoped to the run context rather than the process
/// environment, so it cannot leak into sibling or unrelated invocations.
#[derive(Debug, Clone, Default)]
pub struct RecursionGuard {
    active: Arc<AtomicBool>,
}

impl RecursionGuard {
    /// Create an inactive guard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the guard is currently held
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Hold the guard until the returned handle is dropped
    #[must_use]
    pub fn hold(&self) -> GuardHold {
        self.active.store(true, Ordering::SeqCst);
        GuardHold {
            guard: self.clone(),
        }
    }
}

/// RAII handle releasing the recursion guard on drop
pub struct GuardHold {
    guard: RecursionGuard,
}

impl Drop for GuardHold {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::SeqCst);
    }
}

/// Execution context for one hook run
pub struct Context<'a> {
    config: &'a Config,
    repository: &'a dyn Repository,
    io: &'a dyn Io,
    hook: HookName,
    guard: RecursionGuard,
    skip_requested: bool,
}

impl<'a> Context<'a> {
    /// Create a context for the given hook
    pub fn new(
        config: &'a Config,
        repository: &'a dyn Repository,
        io: &'a dyn Io,
        hook: HookName,
        guard: RecursionGuard,
    ) -> Self {
        Self {
            config,
            repository,
            io,
            hook,
            guard,
            skip_requested: false,
        }
    }

    /// The loaded configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        self.config
    }

    /// The repository capability
    #[must_use]
    pub fn repository(&self) -> &dyn Repository {
        self.repository
    }

    /// The IO capability
    #[must_use]
    pub fn io(&self) -> &dyn Io {
        self.io
    }

    /// The hook this run is for
    #[must_use]
    pub fn hook(&self) -> HookName {
        self.hook
    }

    /// The run-scoped recursion guard
    #[must_use]
    pub fn guard(&self) -> &RecursionGuard {
        &self.guard
    }

    /// Request that the remaining actions of this run be skipped
    ///
    /// Callable from plugin `before_hook`/`before_action`; once set, the
    /// runner marks pending actions as deactivated instead of dispatching
    /// them.
    pub fn request_skip(&mut self) {
        self.skip_requested = true;
    }

    /// Check whether a plugin requested the skip
    #[must_use]
    pub fn skip_requested(&self) -> bool {
        self.skip_requested
    }

    /// Files changed by the ref move that fired this hook
    ///
    /// Uses the `previous-head`/`new-head` hook arguments when present,
    /// falling back to the reflog.
    pub fn changed_files(&self) -> Result<Vec<PathBuf>> {
        let from = self.io.argument("previous-head").unwrap_or("HEAD@{1}");
        let to = self.io.argument("new-head").unwrap_or("HEAD");
        self.repository.files_changed_between(from, to)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_guard_hold_and_release() {
        let guard = RecursionGuard::new();
        assert!(!guard.is_active());

        {
            let _hold = guard.hold();
            assert!(guard.is_active());

            // Clones observe the same flag
            let clone = guard.clone();
            assert!(clone.is_active());
        }

        assert!(!guard.is_active());
    }

    #[test]
    fn test_skip_flag() {
        let config = Config::default();
        let repository = crate::testing::FakeRepository::default();
        let io = grapnel_core::NullIo::new();
        let mut ctx = Context::new(
            &config,
            &repository,
            &io,
            HookName::PreCommit,
            RecursionGuard::new(),
        );

        assert!(!ctx.skip_requested());
        ctx.request_skip();
        assert!(ctx.skip_requested());
    }
}
