//! Grapnel CLI library
//!
//! This library contains all the CLI logic for grapnel, making it reusable
//! for testing and integration with other tools.

pub mod cmd;
pub mod error;
pub mod io;
pub mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grapnel_config::Config;
use grapnel_core::Verbosity;
use std::path::{Path, PathBuf};

/// Grapnel - a git hook manager
#[derive(Parser)]
#[command(name = "grapnel")]
#[command(about = "Manage your git hooks with grapnel")]
#[command(version)]
#[command(long_about = "Manage your git hooks with grapnel

A fast git hook manager written in Rust.

Hooks, actions, conditions and plugins are configured declaratively in a
single grapnel.json at the repository root. `grapnel install` writes the
hook scripts; from then on git fires them and `grapnel run` decides what
actually runs.")]
pub struct Cli {
    /// Path to the configuration file (default: <repository>/grapnel.json)
    #[arg(long, env = "GRAPNEL_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the git repository (default: current directory)
    #[arg(long, env = "GRAPNEL_REPOSITORY", value_name = "DIR")]
    pub repository: Option<PathBuf>,

    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "GRAPNEL_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the grapnel CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Install hook scripts into .git/hooks
    Install {
        /// Overwrite hook scripts not written by grapnel
        #[arg(short, long)]
        force: bool,
    },

    /// Remove grapnel-owned hook scripts from .git/hooks
    Uninstall,

    /// Run a hook (invoked by the installed hook scripts)
    Run {
        /// Name of the fired hook (e.g. pre-commit)
        hook: String,

        /// Original arguments git passed to the hook
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List configured hooks
    List {
        /// Output format (simple, json)
        #[arg(short, long, default_value = "simple")]
        format: String,
    },

    /// Show detailed information about a specific hook
    Info {
        /// Name of the hook to show
        hook: String,
    },
}

/// Main entry point for the CLI logic
///
/// # Errors
///
/// Returns an error if logging initialization, configuration loading, or
/// command execution fails. A failed hook run is an error so the process
/// exits non-zero and git aborts the triggering operation.
pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let working_dir = match &cli.repository {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match cli.command {
        Commands::Install { force } => cmd::install::run(&working_dir, force)?,
        Commands::Uninstall => cmd::uninstall::run(&working_dir)?,
        Commands::Run { hook, args } => {
            let (config, config_dir) = load_config(cli.config.as_deref(), &working_dir)?;
            let repo_root = resolve_repo_root(cli.repository.as_deref(), &config, &config_dir)
                .unwrap_or(working_dir);
            let verbosity = resolve_verbosity(cli.verbose, &config);
            cmd::run::run(&repo_root, &config, &hook, &args, verbosity)?;
        }
        Commands::List { format } => {
            let (config, _) = load_config(cli.config.as_deref(), &working_dir)?;
            cmd::list::run(&config, &format)?;
        }
        Commands::Info { hook } => {
            let (config, _) = load_config(cli.config.as_deref(), &working_dir)?;
            cmd::info::run(&config, &hook)?;
        }
    }

    Ok(())
}

/// Load the configuration and return it with its directory
fn load_config(config_path: Option<&Path>, working_dir: &Path) -> Result<(Config, PathBuf)> {
    let path = config_path.map_or_else(
        || working_dir.join(grapnel_config::config::CONFIG_FILE),
        Path::to_path_buf,
    );

    if !path.exists() {
        return Err(error::CommandError::ConfigNotFound { path }.into());
    }

    let config = Config::load(&path)?;
    let dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((config, dir))
}

/// Repository override from the `git-directory` setting
///
/// An explicit `--repository` always wins; otherwise a configured
/// `git-directory` is resolved relative to the configuration file.
fn resolve_repo_root(
    cli_repository: Option<&Path>,
    config: &Config,
    config_dir: &Path,
) -> Option<PathBuf> {
    if cli_repository.is_some() {
        return None;
    }

    config.settings.git_directory.as_ref().map(|git_dir| {
        if git_dir.is_absolute() {
            git_dir.clone()
        } else {
            config_dir.join(git_dir)
        }
    })
}

/// Effective output verbosity for a hook run
fn resolve_verbosity(verbose_flag: bool, config: &Config) -> Verbosity {
    if verbose_flag {
        return Verbosity::Debug;
    }

    match config.settings.verbosity.as_deref() {
        Some("debug") => Verbosity::Debug,
        Some("verbose") => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_resolve_verbosity() {
        let config = Config::from_json_str(r#"{"config": {"verbosity": "verbose"}}"#).unwrap();
        assert_eq!(resolve_verbosity(false, &config), Verbosity::Verbose);
        assert_eq!(resolve_verbosity(true, &config), Verbosity::Debug);

        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(resolve_verbosity(false, &config), Verbosity::Normal);
    }

    #[test]
    fn test_resolve_repo_root_prefers_cli() {
        let config =
            Config::from_json_str(r#"{"config": {"git-directory": "../repo"}}"#).unwrap();

        // Explicit --repository disables the config override
        assert_eq!(
            resolve_repo_root(Some(Path::new("/explicit")), &config, Path::new("/cfg")),
            None
        );

        // Relative git-directory resolves against the config directory
        assert_eq!(
            resolve_repo_root(None, &config, Path::new("/cfg")),
            Some(PathBuf::from("/cfg/../repo"))
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(None, dir.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("grapnel.json"));
    }

    #[test]
    fn test_cli_parses_run_with_forwarded_args() {
        let cli = Cli::parse_from([
            "grapnel",
            "run",
            "post-checkout",
            "abc123",
            "def456",
            "1",
        ]);
        match cli.command {
            Commands::Run { hook, args } => {
                assert_eq!(hook, "post-checkout");
                assert_eq!(args, vec!["abc123", "def456", "1"]);
            }
            _ => panic!("expected run command"),
        }
    }
}
