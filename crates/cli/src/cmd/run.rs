//! Run a fired hook
//!
//! This is what the installed hook scripts invoke: `grapnel run <hook>`
//! with git's original argv forwarded. The exit code tells git whether to
//! proceed.

use crate::error::{CommandError, Result};
use crate::io::StdIo;
use grapnel_config::Config;
use grapnel_core::{HookName, Outcome, Verbosity};
use grapnel_engine::repository::Git2Repository;
use grapnel_engine::runner::HookRunner;
use owo_colors::OwoColorize;
use std::path::Path;

/// Run the named hook against the loaded configuration
pub fn run(
    repo_root: &Path,
    config: &Config,
    hook_name: &str,
    args: &[String],
    verbosity: Verbosity,
) -> Result<()> {
    let hook: HookName = hook_name.parse()?;
    tracing::debug!(hook = %hook, ?args, "Running hook");

    let repository = Git2Repository::open(repo_root)?;
    let io = StdIo::new(verbosity).with_hook_invocation(hook, args)?;

    let mut runner = HookRunner::new(config, &repository, &io)?;
    let summary = runner.run(hook)?;

    // Failed actions report their captured output
    for report in summary.reports() {
        for entry in report.log.entries() {
            if entry.outcome == Outcome::Failed {
                eprintln!("{} {}", "action failed:".red().bold(), entry.action);
                for message in &entry.messages {
                    eprintln!("  {}", message.text);
                }
            }
        }
    }

    if summary.succeeded() {
        Ok(())
    } else {
        Err(CommandError::HookFailed { hook })
    }
}
