//! Hook script installation
//!
//! Installs, for each native hook, a small script into the repository's
//! hooks directory that re-invokes grapnel with the fired hook's name and
//! forwards the hook's original argv (stdin is inherited by the child).
//! Scripts written by grapnel carry a marker line so foreign hooks are
//! never overwritten without `--force` and uninstall only removes our own
//! scripts.

use grapnel_core::{Error, HookName, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SCRIPT_MARKER: &str = "# installed by grapnel";

/// Installs and removes hook scripts in `.git/hooks`
pub struct Installer {
    hooks_dir: PathBuf,
    force: bool,
}

impl Installer {
    /// Create an installer for the repository containing `path`
    ///
    /// # Errors
    ///
    /// Returns an error if no git repository is found.
    pub fn new(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path)
            .map_err(|e| Error::Git(e.message().to_string()))?;
        Ok(Self {
            hooks_dir: repo.path().join("hooks"),
            force: false,
        })
    }

    /// Create an installer writing directly into the given hooks directory
    #[must_use]
    pub fn for_hooks_dir(hooks_dir: PathBuf) -> Self {
        Self {
            hooks_dir,
            force: false,
        }
    }

    /// Overwrite hook scripts not written by grapnel
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// The hooks directory this installer writes to
    #[must_use]
    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    /// Install scripts for all native hooks
    ///
    /// # Errors
    ///
    /// Returns an error if a foreign hook script is in the way (without
    /// force) or a script cannot be written.
    pub fn install(&self) -> Result<Vec<HookName>> {
        fs::create_dir_all(&self.hooks_dir)?;

        let mut installed = Vec::new();
        for hook in HookName::NATIVE {
            self.install_hook(hook)?;
            installed.push(hook);
        }
        Ok(installed)
    }

    /// Install the script for a single native hook
    ///
    /// # Errors
    ///
    /// Returns an error for virtual hooks, foreign scripts (without
    /// force), or write failures.
    pub fn install_hook(&self, hook: HookName) -> Result<()> {
        if hook.is_virtual() {
            return Err(Error::Config(format!(
                "Virtual hook '{hook}' cannot be installed; git only fires native hooks"
            )));
        }

        let path = self.hooks_dir.join(hook.as_str());
        if path.exists() && !self.force {
            let existing = fs::read_to_string(&path).unwrap_or_default();
            if !existing.contains(SCRIPT_MARKER) {
                return Err(Error::Config(format!(
                    "A hook script already exists at {}; re-run with --force to overwrite",
                    path.display()
                )));
            }
        }

        tracing::debug!(hook = %hook, path = %path.display(), "Writing hook script");
        fs::write(&path, hook_script(hook))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(())
    }

    /// Remove all grapnel-owned hook scripts
    ///
    /// # Errors
    ///
    /// Returns an error if a script cannot be removed.
    pub fn uninstall(&self) -> Result<Vec<HookName>> {
        let mut removed = Vec::new();
        for hook in HookName::NATIVE {
            let path = self.hooks_dir.join(hook.as_str());
            if !path.exists() {
                continue;
            }

            let content = fs::read_to_string(&path).unwrap_or_default();
            if content.contains(SCRIPT_MARKER) {
                tracing::debug!(hook = %hook, "Removing hook script");
                fs::remove_file(&path)?;
                removed.push(hook);
            } else {
                tracing::debug!(hook = %hook, "Leaving foreign hook script in place");
            }
        }
        Ok(removed)
    }
}

/// The script text written for a native hook
fn hook_script(hook: HookName) -> String {
    format!(
        "#!/bin/sh\n{SCRIPT_MARKER}\n\ngrapnel run {hook} \"$@\"\n"
    )
}
