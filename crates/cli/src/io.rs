//! Terminal-backed IO for hook runs
//!
//! Maps the positional argv an installed hook script forwards into named
//! arguments, captures standard input for the hooks that receive it, and
//! writes run output to stdout filtered by verbosity.

use grapnel_core::{HookName, Io, Verbosity};
use indexmap::IndexMap;
use std::io::{IsTerminal, Read};

/// IO implementation bound to the process's stdin/stdout
pub struct StdIo {
    arguments: IndexMap<String, String>,
    standard_input: String,
    verbosity: Verbosity,
}

impl StdIo {
    /// Create an IO at the given verbosity with no hook arguments
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            arguments: IndexMap::new(),
            standard_input: String::new(),
            verbosity,
        }
    }

    /// Bind the original hook invocation: map argv to the hook's named
    /// arguments and capture stdin when the hook receives data on it
    pub fn with_hook_invocation(mut self, hook: HookName, args: &[String]) -> std::io::Result<Self> {
        for (name, value) in hook.argument_names().iter().zip(args) {
            self.arguments.insert((*name).to_string(), value.clone());
        }

        if hook.receives_stdin() && !std::io::stdin().is_terminal() {
            let mut stdin = String::new();
            std::io::stdin().read_to_string(&mut stdin)?;
            self.standard_input = stdin;
        }

        Ok(self)
    }
}

impl Io for StdIo {
    fn arguments(&self) -> &IndexMap<String, String> {
        &self.arguments
    }

    fn standard_input(&self) -> &str {
        &self.standard_input
    }

    fn write(&self, text: &str, verbosity: Verbosity) {
        if verbosity <= self.verbosity {
            println!("{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_argv_is_mapped_to_named_arguments() {
        let args = vec![
            ".git/COMMIT_EDITMSG".to_string(),
            "message".to_string(),
            "HEAD".to_string(),
        ];
        let io = StdIo::new(Verbosity::Normal)
            .with_hook_invocation(HookName::PrepareCommitMsg, &args)
            .unwrap();

        assert_eq!(io.argument("message-file"), Some(".git/COMMIT_EDITMSG"));
        assert_eq!(io.argument("mode"), Some("message"));
        assert_eq!(io.argument("hash"), Some("HEAD"));
    }

    #[test]
    fn test_missing_trailing_arguments_are_absent() {
        let args = vec![".git/COMMIT_EDITMSG".to_string()];
        let io = StdIo::new(Verbosity::Normal)
            .with_hook_invocation(HookName::PrepareCommitMsg, &args)
            .unwrap();

        assert_eq!(io.argument("message-file"), Some(".git/COMMIT_EDITMSG"));
        assert_eq!(io.argument("mode"), None);
    }
}
