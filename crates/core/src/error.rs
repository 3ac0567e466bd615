//! Base error types for grapnel
//!
//! This module provides the foundation error types that all crates can use.

use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hook name is not in the native/virtual enumeration
    #[error("Invalid hook name: '{name}'")]
    InvalidHookName { name: String },

    /// Configuration error (load or validation failure)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced condition implementation cannot be located
    #[error("Unresolvable condition: '{name}'")]
    ConditionUnresolvable { name: String },

    /// Referenced action implementation cannot be located
    #[error("Unresolvable action: '{name}'")]
    ActionUnresolvable { name: String },

    /// Referenced plugin implementation cannot be located
    #[error("Unresolvable plugin: '{name}'")]
    PluginUnresolvable { name: String },

    /// A plugin lifecycle callback failed
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Git operation error
    #[error("Git error: {0}")]
    Git(String),

    /// Re-applying the preserved working-tree patch failed
    ///
    /// The patch file is kept on disk so the user can recover manually.
    #[error(
        "Failed to restore working tree: {reason}\n\
         Your uncommitted changes are preserved in '{}'.\n\
         Apply them manually with: git apply {}",
        patch.display(),
        patch.display()
    )]
    WorkingTreeRestore { patch: PathBuf, reason: String },

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
