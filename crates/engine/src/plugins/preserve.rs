//! Working-tree preservation plugin
//!
//! Before a pre-commit hook runs, this plugin snapshots uncommitted state
//! so actions only ever see what is actually being committed:
//!
//! - intent-to-add entries are removed from the index (paths cached)
//! - unstaged changes are written to a patch file and the working tree is
//!   hard-reset to the index
//!
//! After the hook, the patch is re-applied and the intent-to-add paths are
//! re-marked. The reset is performed while holding the run's recursion
//! guard so a post-checkout hook fired by the checkout cannot re-enter
//! hook processing. A patch that cannot be restored is a fatal error that
//! reports the patch location — uncommitted work is never dropped
//! silently.

use super::Plugin;
use crate::context::Context;
use grapnel_core::{Error, HookName, Restriction, Result, Verbosity};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Snapshot taken by `before_hook`
enum CaptureState {
    None,
    Captured {
        patch: Option<PathBuf>,
        intent_to_add: Vec<PathBuf>,
    },
}

/// Plugin saving and restoring uncommitted working-tree state
pub struct PreserveWorkingTree {
    state: CaptureState,
}

impl PreserveWorkingTree {
    /// Create the plugin in its un-captured state
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CaptureState::None,
        }
    }

    fn write_patch_file(patch: &[u8]) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("grapnel-unstaged-")
            .suffix(".patch")
            .tempfile()
            .map_err(|e| Error::Message(format!("Failed to create patch file: {e}")))?;

        file.write_all(patch)
            .map_err(|e| Error::Message(format!("Failed to write patch file: {e}")))?;

        // Keep the file: it must survive the hook run, and on restore
        // failure the user needs it to recover manually.
        let (_file, path) = file
            .keep()
            .map_err(|e| Error::Message(format!("Failed to keep patch file: {e}")))?;
        Ok(path)
    }

    fn restore_patch(ctx: &Context<'_>, path: &Path) -> Result<()> {
        let patch = std::fs::read(path).map_err(|e| Error::WorkingTreeRestore {
            patch: path.to_path_buf(),
            reason: format!("cannot read patch file: {e}"),
        })?;

        if let Err(first) = ctx.repository().apply_patch(&patch) {
            tracing::warn!(
                error = %first,
                "Patch failed to apply, rolling back and retrying with normalized line endings"
            );

            {
                let _hold = ctx.guard().hold();
                ctx.repository().reset_worktree()?;
            }

            let normalized = normalize_line_endings(&patch);
            ctx.repository()
                .apply_patch(&normalized)
                .map_err(|e| Error::WorkingTreeRestore {
                    patch: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }

        if let Err(e) = std::fs::remove_file(path) {
            tracing::debug!(patch = %path.display(), error = %e, "Could not delete patch file");
        }
        Ok(())
    }
}

impl Default for PreserveWorkingTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PreserveWorkingTree {
    fn restriction(&self) -> Restriction {
        Restriction::of([HookName::PreCommit])
    }

    fn before_hook(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let intent_to_add = ctx.repository().intent_to_add_paths()?;
        if !intent_to_add.is_empty() {
            tracing::debug!(
                count = intent_to_add.len(),
                "Removing intent-to-add entries from the index"
            );
            ctx.repository().remove_from_index(&intent_to_add)?;
        }

        let patch = match ctx.repository().unstaged_patch()? {
            Some(bytes) => {
                let path = Self::write_patch_file(&bytes)?;
                tracing::debug!(patch = %path.display(), "Captured unstaged changes");
                ctx.io().write(
                    &format!("unstaged changes saved to {}", path.display()),
                    Verbosity::Verbose,
                );

                {
                    let _hold = ctx.guard().hold();
                    ctx.repository().reset_worktree()?;
                }

                Some(path)
            }
            None => None,
        };

        self.state = if patch.is_none() && intent_to_add.is_empty() {
            CaptureState::None
        } else {
            CaptureState::Captured {
                patch,
                intent_to_add,
            }
        };

        Ok(())
    }

    fn after_hook(&mut self, ctx: &mut Context<'_>, _log: &grapnel_core::RunLog) -> Result<()> {
        let state = std::mem::replace(&mut self.state, CaptureState::None);
        let CaptureState::Captured {
            patch,
            intent_to_add,
        } = state
        else {
            return Ok(());
        };

        if let Some(path) = patch {
            Self::restore_patch(ctx, &path)?;
            ctx.io()
                .write("unstaged changes restored", Verbosity::Verbose);
        }

        if !intent_to_add.is_empty() {
            ctx.repository().mark_intent_to_add(&intent_to_add)?;
        }

        Ok(())
    }
}

/// Normalize CRLF line endings so a patch survives auto-fixes made by hook
/// actions
fn normalize_line_endings(patch: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(patch.len());
    let mut i = 0;
    while i < patch.len() {
        if patch[i] == b'\r' && patch.get(i + 1) == Some(&b'\n') {
            i += 1;
            continue;
        }
        out.push(patch[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::context::RecursionGuard;
    use crate::repository::Repository;
    use grapnel_config::Config;
    use grapnel_core::NullIo;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings(b"a\r\nb\r\n"), b"a\nb\n");
        assert_eq!(normalize_line_endings(b"a\nb\n"), b"a\nb\n");
        assert_eq!(normalize_line_endings(b"\r\n"), b"\n");
        // Lone carriage returns are preserved
        assert_eq!(normalize_line_endings(b"a\rb"), b"a\rb");
    }

    /// Repository stub that records guard state at reset time
    struct GuardObserving {
        workdir: std::path::PathBuf,
        guard: RecursionGuard,
        guarded_resets: Arc<Mutex<Vec<bool>>>,
        patch: Option<Vec<u8>>,
    }

    impl Repository for GuardObserving {
        fn workdir(&self) -> &Path {
            &self.workdir
        }

        fn current_branch(&self) -> Result<String> {
            Ok("main".to_string())
        }

        fn staged_files(&self) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }

        fn files_changed_between(&self, _from: &str, _to: &str) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }

        fn branch_files(&self, _compared_to: &str) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }

        fn intent_to_add_paths(&self) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }

        fn remove_from_index(&self, _paths: &[PathBuf]) -> Result<()> {
            Ok(())
        }

        fn mark_intent_to_add(&self, _paths: &[PathBuf]) -> Result<()> {
            Ok(())
        }

        fn unstaged_patch(&self) -> Result<Option<Vec<u8>>> {
            Ok(self.patch.clone())
        }

        fn reset_worktree(&self) -> Result<()> {
            self.guarded_resets
                .lock()
                .unwrap()
                .push(self.guard.is_active());
            Ok(())
        }

        fn apply_patch(&self, _patch: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reset_happens_under_recursion_guard() {
        let guard = RecursionGuard::new();
        let guarded_resets = Arc::new(Mutex::new(Vec::new()));
        let repository = GuardObserving {
            workdir: std::env::temp_dir(),
            guard: guard.clone(),
            guarded_resets: Arc::clone(&guarded_resets),
            patch: Some(b"diff --git a/f b/f\n".to_vec()),
        };

        let config = Config::default();
        let io = NullIo::new();
        let mut ctx = Context::new(&config, &repository, &io, HookName::PreCommit, guard.clone());

        let mut plugin = PreserveWorkingTree::new();
        plugin.before_hook(&mut ctx).unwrap();

        // The reset ran exactly once, with the guard held
        assert_eq!(*guarded_resets.lock().unwrap(), vec![true]);
        // The guard is released again afterwards
        assert!(!guard.is_active());

        // Restore cleans up the patch file
        plugin
            .after_hook(&mut ctx, &grapnel_core::RunLog::new(HookName::PreCommit))
            .unwrap();
    }

    #[test]
    fn test_nothing_captured_is_a_no_op() {
        let guard = RecursionGuard::new();
        let guarded_resets = Arc::new(Mutex::new(Vec::new()));
        let repository = GuardObserving {
            workdir: std::env::temp_dir(),
            guard: guard.clone(),
            guarded_resets: Arc::clone(&guarded_resets),
            patch: None,
        };

        let config = Config::default();
        let io = NullIo::new();
        let mut ctx = Context::new(&config, &repository, &io, HookName::PreCommit, guard);

        let mut plugin = PreserveWorkingTree::new();
        plugin.before_hook(&mut ctx).unwrap();
        plugin
            .after_hook(&mut ctx, &grapnel_core::RunLog::new(HookName::PreCommit))
            .unwrap();

        assert!(guarded_resets.lock().unwrap().is_empty());
    }
}
