//! Install hook scripts into the repository

use crate::error::Result;
use grapnel_engine::installer::Installer;
use owo_colors::OwoColorize;
use std::path::Path;

/// Install scripts for all native hooks
pub fn run(repo_root: &Path, force: bool) -> Result<()> {
    let installer = Installer::new(repo_root)?.force(force);
    let installed = installer.install()?;

    println!(
        "Installed {} hook scripts into {}",
        installed.len(),
        installer.hooks_dir().display().to_string().cyan()
    );
    for hook in installed {
        println!("  • {}", hook.to_string().green());
    }

    Ok(())
}
