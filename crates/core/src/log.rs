//! Per-run log types
//!
//! Every action produces an [`ActionLog`] with one of four outcomes and a
//! list of timestamped, verbosity-tagged messages. Action logs are
//! aggregated into the per-hook [`RunLog`], which is read-only for the
//! caller once the run finishes.

use crate::hooks::HookName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verbosity level of a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Shown by default
    Normal,
    /// Shown with `--verbose`
    Verbose,
    /// Shown only when debugging
    Debug,
}

/// Outcome of a single action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The action ran and reported success
    Succeeded,
    /// The action ran and reported failure
    Failed,
    /// The action's conditions did not apply
    Skipped,
    /// A plugin requested that remaining actions be skipped
    Deactivated,
}

impl Outcome {
    /// Stable user-visible label for this outcome
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Succeeded => "ok",
            Outcome::Failed => "failed",
            Outcome::Skipped => "skipped",
            Outcome::Deactivated => "deactivated",
        }
    }
}

/// A single timestamped log message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
    /// Verbosity at which the message should surface
    pub verbosity: Verbosity,
    /// Message text
    pub text: String,
}

impl LogMessage {
    /// Create a message stamped with the current time
    #[must_use]
    pub fn new(verbosity: Verbosity, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            verbosity,
            text: text.into(),
        }
    }
}

/// The record of one action within a hook run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    /// The configured executable string identifying the action
    pub action: String,
    /// Final outcome
    pub outcome: Outcome,
    /// Messages collected while the action ran
    pub messages: Vec<LogMessage>,
}

impl ActionLog {
    /// Create a log entry with no messages
    #[must_use]
    pub fn new(action: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            action: action.into(),
            outcome,
            messages: Vec::new(),
        }
    }

    /// Append a message
    pub fn message(&mut self, verbosity: Verbosity, text: impl Into<String>) {
        self.messages.push(LogMessage::new(verbosity, text));
    }

    /// Builder-style variant of [`ActionLog::message`]
    #[must_use]
    pub fn with_message(mut self, verbosity: Verbosity, text: impl Into<String>) -> Self {
        self.message(verbosity, text);
        self
    }

    /// Check whether the action failed
    #[must_use]
    pub fn failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }
}

/// Aggregated log of one hook run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    /// The hook this log belongs to
    pub hook: HookName,
    entries: Vec<ActionLog>,
}

impl RunLog {
    /// Create an empty log for the given hook
    #[must_use]
    pub fn new(hook: HookName) -> Self {
        Self {
            hook,
            entries: Vec::new(),
        }
    }

    /// Record an action log
    pub fn add(&mut self, entry: ActionLog) {
        self.entries.push(entry);
    }

    /// All recorded entries, in execution order
    #[must_use]
    pub fn entries(&self) -> &[ActionLog] {
        &self.entries
    }

    /// The most recently recorded entry
    #[must_use]
    pub fn last(&self) -> Option<&ActionLog> {
        self.entries.last()
    }

    /// Check whether any action failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(ActionLog::failed)
    }

    /// Number of entries with the given outcome
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }
}
