//! Remove grapnel-owned hook scripts from the repository

use crate::error::Result;
use grapnel_engine::installer::Installer;
use owo_colors::OwoColorize;
use std::path::Path;

/// Remove every hook script written by grapnel, leaving foreign hooks
/// untouched
pub fn run(repo_root: &Path) -> Result<()> {
    let installer = Installer::new(repo_root)?;
    let removed = installer.uninstall()?;

    if removed.is_empty() {
        println!("{}", "No grapnel hook scripts found.".yellow());
        return Ok(());
    }

    println!("Removed {} hook scripts", removed.len());
    for hook in removed {
        println!("  • {}", hook.to_string().green());
    }

    Ok(())
}
