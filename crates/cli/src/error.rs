//! Error types for CLI commands
//!
//! This module defines structured error types using thiserror, providing
//! better type safety than using `anyhow::Error` everywhere.

use grapnel_core::HookName;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// No configuration file where one was expected
    #[error(
        "Configuration file not found: {}\n\
         Create it with a hook section, for example:\n\
         {{\"pre-commit\": {{\"actions\": [{{\"action\": \"cargo fmt --check\"}}]}}}}",
        path.display()
    )]
    ConfigNotFound {
        /// The path that was checked
        path: PathBuf,
    },

    /// A hook run finished with failed actions
    #[error("Hook '{hook}' failed")]
    HookFailed {
        /// The hook that failed
        hook: HookName,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error bubbled up from the core/engine crates
    #[error(transparent)]
    Core(#[from] grapnel_core::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;
