//! Built-in commit message handlers
//!
//! Both handlers read the message file git hands to the commit-msg hook and
//! are restricted to it; comment lines never count as message content.

use super::{ActionRegistry, ActionRunner};
use crate::context::Context;
use grapnel_config::ActionConfig;
use grapnel_core::{Error, HookName, Restriction, Result};

const DEFAULT_SUBJECT_LENGTH: u64 = 50;

/// Register the built-in message handlers
pub fn register(registry: &mut ActionRegistry) {
    registry.register(
        "message.not-empty",
        Box::new(|| Box::new(MessageNotEmpty) as Box<dyn ActionRunner>),
    );
    registry.register(
        "message.subject-length",
        Box::new(|| Box::new(MessageSubjectLength) as Box<dyn ActionRunner>),
    );
}

fn message_restriction() -> Restriction {
    Restriction::of([HookName::CommitMsg])
}

/// Read the commit message file passed to the hook
fn read_message(ctx: &Context<'_>) -> Result<String> {
    let file = ctx.io().argument("message-file").ok_or_else(|| {
        Error::Config("Hook did not receive a commit message file argument".to_string())
    })?;

    let path = ctx.repository().workdir().join(file);
    std::fs::read_to_string(&path).map_err(|e| {
        Error::Message(format!(
            "Failed to read commit message file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Message lines that count as content (comments stripped)
fn content_lines(message: &str) -> impl Iterator<Item = &str> {
    message.lines().filter(|line| !line.starts_with('#'))
}

/// Fails when the commit message has no content
struct MessageNotEmpty;

impl ActionRunner for MessageNotEmpty {
    fn restriction(&self) -> Restriction {
        message_restriction()
    }

    fn execute(&self, ctx: &Context<'_>, _action: &ActionConfig) -> Result<()> {
        let message = read_message(ctx)?;
        if content_lines(&message).all(|line| line.trim().is_empty()) {
            return Err(Error::Message(
                "Commit message must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fails when the subject line exceeds the configured length
///
/// Option `max-length` overrides the default of 50 characters.
struct MessageSubjectLength;

impl ActionRunner for MessageSubjectLength {
    fn restriction(&self) -> Restriction {
        message_restriction()
    }

    fn execute(&self, ctx: &Context<'_>, action: &ActionConfig) -> Result<()> {
        #[allow(clippy::cast_possible_truncation)]
        let max = action
            .option_u64("max-length")
            .unwrap_or(DEFAULT_SUBJECT_LENGTH) as usize;

        let message = read_message(ctx)?;
        let subject = content_lines(&message)
            .find(|line| !line.trim().is_empty())
            .unwrap_or("");

        let length = subject.chars().count();
        if length > max {
            return Err(Error::Message(format!(
                "Commit subject is {length} characters long, the limit is {max}"
            )));
        }
        Ok(())
    }
}
