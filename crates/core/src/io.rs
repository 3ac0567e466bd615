//! IO capability trait
//!
//! Actions, conditions and plugins never touch stdin/stdout directly; they
//! go through an [`Io`] implementation. The CLI provides a terminal-backed
//! implementation, tests use [`NullIo`].

use crate::log::Verbosity;
use indexmap::IndexMap;

/// Access to the original hook invocation and user-facing output
pub trait Io {
    /// Named arguments of the original hook invocation
    ///
    /// Positional argv from the installed hook script, mapped to names via
    /// [`crate::HookName::argument_names`].
    fn arguments(&self) -> &IndexMap<String, String>;

    /// Look up a single named argument
    fn argument(&self, name: &str) -> Option<&str> {
        self.arguments().get(name).map(String::as_str)
    }

    /// The standard input the hook received, captured up front
    fn standard_input(&self) -> &str;

    /// Write a line of user-facing output at the given verbosity
    fn write(&self, text: &str, verbosity: Verbosity);
}

/// IO implementation that swallows all output
///
/// Used in tests and wherever a run must stay silent.
#[derive(Debug, Default)]
pub struct NullIo {
    arguments: IndexMap<String, String>,
    standard_input: String,
}

impl NullIo {
    /// Create a silent IO with no arguments and empty stdin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the named hook arguments
    #[must_use]
    pub fn with_arguments(mut self, arguments: IndexMap<String, String>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Set a single named argument
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Set the captured standard input
    #[must_use]
    pub fn with_standard_input(mut self, stdin: impl Into<String>) -> Self {
        self.standard_input = stdin.into();
        self
    }
}

impl Io for NullIo {
    fn arguments(&self) -> &IndexMap<String, String> {
        &self.arguments
    }

    fn standard_input(&self) -> &str {
        &self.standard_input
    }

    fn write(&self, _text: &str, _verbosity: Verbosity) {}
}
