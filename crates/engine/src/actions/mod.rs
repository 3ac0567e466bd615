//! Action dispatch
//!
//! The dispatcher detects the executor kind from the configured executable
//! string: a leading `\` marks an in-process handler resolved through the
//! [`ActionRegistry`], everything else is an external command line. Either
//! way the result is an explicit [`ActionLog`] — the fail-fast/collect-all
//! policy is decided by the runner by inspecting outcomes, not by catching
//! errors.

pub mod message;

use crate::context::Context;
use crate::placeholders;
use grapnel_config::ActionConfig;
use grapnel_core::{ActionLog, Error, Outcome, Restriction, Result, Verbosity};
use indexmap::IndexMap;

/// In-process action handler contract
///
/// Handlers are constructed without arguments; their options arrive through
/// the [`ActionConfig`] at call time.
pub trait ActionRunner {
    /// Hooks this handler applies to (empty = everywhere)
    fn restriction(&self) -> Restriction {
        Restriction::empty()
    }

    /// Run the action
    ///
    /// # Errors
    ///
    /// An error is the action's failure signal; the dispatcher records it
    /// as a failed [`ActionLog`] instead of propagating it.
    fn execute(&self, ctx: &Context<'_>, action: &ActionConfig) -> Result<()>;
}

/// Factory constructing an action handler
pub type ActionFactory = Box<dyn Fn() -> Box<dyn ActionRunner> + Send + Sync>;

/// Registry mapping stable handler identifiers to factories
pub struct ActionRegistry {
    factories: IndexMap<String, ActionFactory>,
}

impl ActionRegistry {
    /// Create a registry with no handlers
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Create a registry populated with the built-in handlers
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        message::register(&mut registry);
        registry
    }

    /// Register a handler factory under a stable identifier
    pub fn register(&mut self, name: impl Into<String>, factory: ActionFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Resolve a handler identifier
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionUnresolvable`] for unknown identifiers.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn ActionRunner>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::ActionUnresolvable {
                name: name.to_string(),
            })?;
        Ok(factory())
    }
}

/// Dispatches actions to the correct executor
pub struct ActionDispatcher<'a> {
    registry: &'a ActionRegistry,
}

impl<'a> ActionDispatcher<'a> {
    /// Create a dispatcher backed by the given registry
    #[must_use]
    pub fn new(registry: &'a ActionRegistry) -> Self {
        Self { registry }
    }

    /// The restriction an action declares, if any
    ///
    /// External commands are unrestricted; in-process handlers expose their
    /// own restriction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionUnresolvable`] for unknown handler ids.
    pub fn restriction_of(&self, action: &ActionConfig) -> Result<Restriction> {
        match action.internal_name() {
            Some(name) => Ok(self.registry.resolve(name)?.restriction()),
            None => Ok(Restriction::empty()),
        }
    }

    /// Execute an action and report its outcome
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal problems (unresolvable handler,
    /// unparsable command line, failed placeholder query); an action that
    /// runs and fails is a failed [`ActionLog`], not an `Err`.
    #[tracing::instrument(skip(self, ctx, action), fields(action = %action.action))]
    pub fn execute(&self, ctx: &Context<'_>, action: &ActionConfig) -> Result<ActionLog> {
        if let Some(name) = action.internal_name() {
            self.execute_internal(ctx, name, action)
        } else {
            self.execute_external(ctx, action)
        }
    }

    fn execute_internal(
        &self,
        ctx: &Context<'_>,
        name: &str,
        action: &ActionConfig,
    ) -> Result<ActionLog> {
        let runner = self.registry.resolve(name)?;

        match runner.execute(ctx, action) {
            Ok(()) => {
                tracing::debug!("Action succeeded");
                Ok(ActionLog::new(&action.action, Outcome::Succeeded))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Action failed");
                Ok(ActionLog::new(&action.action, Outcome::Failed)
                    .with_message(Verbosity::Normal, e.to_string()))
            }
        }
    }

    fn execute_external(&self, ctx: &Context<'_>, action: &ActionConfig) -> Result<ActionLog> {
        let rendered = placeholders::replace(ctx, &action.action)?;
        let parts = shell_words::split(&rendered).map_err(|e| {
            Error::Config(format!(
                "Failed to parse command '{}': {}",
                action.action, e
            ))
        })?;

        let Some((program, args)) = parts.split_first() else {
            return Err(Error::Config(format!(
                "Action '{}' resolved to an empty command",
                action.action
            )));
        };

        tracing::debug!(command = %rendered, "Spawning action command");

        let result = duct::cmd(program, args)
            .dir(ctx.repository().workdir())
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run();

        match result {
            Ok(output) => {
                let captured = String::from_utf8_lossy(&output.stdout);
                let captured = captured.trim_end();

                let mut log = if output.status.success() {
                    ActionLog::new(&action.action, Outcome::Succeeded)
                } else {
                    ActionLog::new(&action.action, Outcome::Failed)
                };

                if !captured.is_empty() {
                    let verbosity = if log.failed() {
                        Verbosity::Normal
                    } else {
                        Verbosity::Verbose
                    };
                    log.message(verbosity, captured);
                }

                Ok(log)
            }
            Err(e) => Ok(ActionLog::new(&action.action, Outcome::Failed).with_message(
                Verbosity::Normal,
                format!("Failed to spawn '{program}': {e}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::context::RecursionGuard;
    use crate::testing::FakeRepository;
    use grapnel_config::Config;
    use grapnel_core::{HookName, NullIo};

    struct AlwaysFails;

    impl ActionRunner for AlwaysFails {
        fn execute(&self, _ctx: &Context<'_>, _action: &ActionConfig) -> Result<()> {
            Err(Error::Message("boom".to_string()))
        }
    }

    fn dispatch(registry: &ActionRegistry, action: &ActionConfig) -> Result<ActionLog> {
        let config = Config::default();
        let repository = FakeRepository::default();
        let io = NullIo::new();
        let ctx = Context::new(
            &config,
            &repository,
            &io,
            HookName::PreCommit,
            RecursionGuard::new(),
        );
        ActionDispatcher::new(registry).execute(&ctx, action)
    }

    #[test]
    fn test_external_success_captures_output() {
        let registry = ActionRegistry::empty();
        let log = dispatch(&registry, &ActionConfig::new("echo hello")).unwrap();

        assert_eq!(log.outcome, Outcome::Succeeded);
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].text, "hello");
        assert_eq!(log.messages[0].verbosity, Verbosity::Verbose);
    }

    #[test]
    fn test_external_failure_is_a_failed_log() {
        let registry = ActionRegistry::empty();
        let log = dispatch(&registry, &ActionConfig::new("false")).unwrap();
        assert_eq!(log.outcome, Outcome::Failed);
    }

    #[test]
    fn test_external_spawn_failure_is_a_failed_log() {
        let registry = ActionRegistry::empty();
        let log = dispatch(
            &registry,
            &ActionConfig::new("grapnel-definitely-not-a-binary"),
        )
        .unwrap();

        assert_eq!(log.outcome, Outcome::Failed);
        assert!(log.messages[0].text.contains("Failed to spawn"));
    }

    #[test]
    fn test_internal_failure_signal_becomes_failed_log() {
        let mut registry = ActionRegistry::empty();
        registry.register(
            "test.fails",
            Box::new(|| Box::new(AlwaysFails) as Box<dyn ActionRunner>),
        );

        let log = dispatch(&registry, &ActionConfig::new("\\test.fails")).unwrap();
        assert_eq!(log.outcome, Outcome::Failed);
        assert_eq!(log.messages[0].text, "boom");
    }

    #[test]
    fn test_unknown_handler_is_fatal() {
        let registry = ActionRegistry::empty();
        let result = dispatch(&registry, &ActionConfig::new("\\no.such.handler"));
        assert!(matches!(
            result,
            Err(Error::ActionUnresolvable { name }) if name == "no.such.handler"
        ));
    }

    #[test]
    fn test_restriction_of_external_is_empty() {
        let registry = ActionRegistry::empty();
        let dispatcher = ActionDispatcher::new(&registry);
        let restriction = dispatcher
            .restriction_of(&ActionConfig::new("echo ok"))
            .unwrap();
        assert!(restriction.is_empty());
    }
}
