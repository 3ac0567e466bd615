//! Git operations abstraction layer
//!
//! The engine consumes git through the [`Repository`] capability trait so
//! the runner, conditions and plugins stay testable without a real
//! repository. The default implementation uses git2 (libgit2), shelling out
//! to the git CLI only for intent-to-add marking, which libgit2 does not
//! support.

use grapnel_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Helper function to convert git2 errors to `grapnel_core` errors
#[inline]
#[allow(clippy::needless_pass_by_value)]
fn git_err(e: git2::Error) -> Error {
    Error::Git(e.message().to_string())
}

/// Repository capability consumed by the hook execution engine
pub trait Repository {
    /// Working tree root of the repository
    fn workdir(&self) -> &Path;

    /// Get current branch name
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be determined (e.g. detached
    /// HEAD).
    fn current_branch(&self) -> Result<String>;

    /// Paths with staged changes, relative to the working tree root
    ///
    /// # Errors
    ///
    /// Returns an error if the repository status cannot be read.
    fn staged_files(&self) -> Result<Vec<PathBuf>>;

    /// Paths changed between two revisions
    ///
    /// # Errors
    ///
    /// Returns an error if either revision cannot be resolved.
    fn files_changed_between(&self, from: &str, to: &str) -> Result<Vec<PathBuf>>;

    /// Paths changed on the current branch since it diverged from
    /// `compared_to`
    ///
    /// # Errors
    ///
    /// Returns an error if the merge base cannot be computed.
    fn branch_files(&self, compared_to: &str) -> Result<Vec<PathBuf>>;

    /// Paths currently marked intent-to-add in the index
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    fn intent_to_add_paths(&self) -> Result<Vec<PathBuf>>;

    /// Remove entries from the index (the working-tree files stay put)
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    fn remove_from_index(&self, paths: &[PathBuf]) -> Result<()>;

    /// Mark paths intent-to-add, the equivalent of `git add -N`
    ///
    /// # Errors
    ///
    /// Returns an error if the paths cannot be marked.
    fn mark_intent_to_add(&self, paths: &[PathBuf]) -> Result<()>;

    /// Patch of unstaged changes to tracked files (index → working tree)
    ///
    /// Returns `None` when the working tree matches the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff cannot be computed.
    fn unstaged_patch(&self) -> Result<Option<Vec<u8>>>;

    /// Hard-reset the working tree to the index, keeping untracked files
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout fails.
    fn reset_worktree(&self) -> Result<()>;

    /// Apply a patch to the working tree
    ///
    /// # Errors
    ///
    /// Returns an error if the patch does not apply.
    fn apply_patch(&self, patch: &[u8]) -> Result<()>;
}

/// Repository implementation using git2 (libgit2)
pub struct Git2Repository {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open the repository containing `path`
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found or it has no working
    /// tree.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path).map_err(git_err)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| Error::Git("Repository has no working tree".to_string()))?
            .to_path_buf();
        Ok(Self { repo, workdir })
    }

    /// Location of the repository's hooks directory
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        self.repo.path().join("hooks")
    }

    fn tree_for(&self, rev: &str) -> Result<git2::Tree<'_>> {
        self.repo
            .revparse_single(rev)
            .and_then(|obj| obj.peel_to_commit())
            .and_then(|commit| commit.tree())
            .map_err(git_err)
    }

    fn delta_paths(diff: &git2::Diff<'_>) -> Vec<PathBuf> {
        diff.deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(Path::to_path_buf)
            })
            .collect()
    }
}

impl Repository for Git2Repository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head().map_err(git_err)?;
        let branch = head
            .shorthand()
            .ok_or_else(|| Error::Git("Not on a branch (detached HEAD)".to_string()))?
            .to_string();
        Ok(branch)
    }

    fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts)).map_err(git_err)?;
        let staged = statuses
            .iter()
            .filter(|entry| {
                let status = entry.status();
                status.is_index_new()
                    || status.is_index_modified()
                    || status.is_index_renamed()
                    || status.is_index_typechange()
            })
            .filter_map(|entry| entry.path().map(PathBuf::from))
            .collect();

        Ok(staged)
    }

    fn files_changed_between(&self, from: &str, to: &str) -> Result<Vec<PathBuf>> {
        let from_tree = self.tree_for(from)?;
        let to_tree = self.tree_for(to)?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), None)
            .map_err(git_err)?;

        Ok(Self::delta_paths(&diff))
    }

    fn branch_files(&self, compared_to: &str) -> Result<Vec<PathBuf>> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(git_err)?;
        let base = self
            .repo
            .revparse_single(compared_to)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(git_err)?;

        let merge_base = self
            .repo
            .merge_base(head.id(), base.id())
            .map_err(git_err)?;
        let base_tree = self
            .repo
            .find_commit(merge_base)
            .and_then(|c| c.tree())
            .map_err(git_err)?;
        let head_tree = head.tree().map_err(git_err)?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)
            .map_err(git_err)?;

        Ok(Self::delta_paths(&diff))
    }

    fn intent_to_add_paths(&self) -> Result<Vec<PathBuf>> {
        let mut index = self.repo.index().map_err(git_err)?;
        // Pick up changes made by spawned git processes
        index.read(false).map_err(git_err)?;
        let ita_bit = git2::IndexEntryExtendedFlag::INTENT_TO_ADD.bits();

        let paths = index
            .iter()
            .filter(|entry| entry.flags_extended & ita_bit != 0)
            .map(|entry| PathBuf::from(String::from_utf8_lossy(&entry.path).into_owned()))
            .collect();

        Ok(paths)
    }

    fn remove_from_index(&self, paths: &[PathBuf]) -> Result<()> {
        let mut index = self.repo.index().map_err(git_err)?;
        index.read(false).map_err(git_err)?;
        for path in paths {
            index.remove_path(path).map_err(git_err)?;
        }
        index.write().map_err(git_err)?;
        Ok(())
    }

    fn mark_intent_to_add(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        // libgit2 cannot create intent-to-add entries, so this one
        // operation goes through the git CLI.
        let mut args: Vec<std::ffi::OsString> =
            vec!["add".into(), "--intent-to-add".into(), "--".into()];
        args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));

        let output = duct::cmd("git", args)
            .dir(&self.workdir)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|e| Error::Git(format!("Failed to run git add --intent-to-add: {e}")))?;

        if !output.status.success() {
            return Err(Error::Git(format!(
                "git add --intent-to-add failed: {}",
                String::from_utf8_lossy(&output.stdout).trim()
            )));
        }

        Ok(())
    }

    fn unstaged_patch(&self) -> Result<Option<Vec<u8>>> {
        let mut opts = git2::DiffOptions::new();
        opts.include_untracked(false).show_binary(true);

        let diff = self
            .repo
            .diff_index_to_workdir(None, Some(&mut opts))
            .map_err(git_err)?;

        if diff.deltas().count() == 0 {
            return Ok(None);
        }

        let mut patch = Vec::new();
        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => patch.push(line.origin() as u8),
                _ => {}
            }
            patch.extend_from_slice(line.content());
            true
        })
        .map_err(git_err)?;

        if patch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(patch))
        }
    }

    fn reset_worktree(&self) -> Result<()> {
        self.repo
            .checkout_head(Some(
                git2::build::CheckoutBuilder::new()
                    .force()
                    .remove_untracked(false),
            ))
            .map_err(git_err)
    }

    fn apply_patch(&self, patch: &[u8]) -> Result<()> {
        let diff = git2::Diff::from_buffer(patch).map_err(git_err)?;
        self.repo
            .apply(&diff, git2::ApplyLocation::WorkDir, None)
            .map_err(git_err)
    }
}
