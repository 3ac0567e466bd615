//! Core types for grapnel
//!
//! This is the foundation crate (Layer 0) that all other grapnel crates
//! depend on. It provides:
//! - The native/virtual hook enumeration and `Restriction` sets
//! - Base error types
//! - Run log types (action outcomes and messages)
//! - The `Io` capability trait used by actions, conditions and plugins
//!
//! This crate has no dependencies on other grapnel crates.

pub mod error;
pub mod hooks;
pub mod io;
pub mod log;

pub use error::{Error, Result};
pub use hooks::{HookName, Restriction};
pub use io::{Io, NullIo};
pub use log::{ActionLog, LogMessage, Outcome, RunLog, Verbosity};
