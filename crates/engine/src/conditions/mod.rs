//! Condition evaluation
//!
//! A condition is one of three things: an `and`/`or` combinator over nested
//! conditions, an external command (true iff exit code 0), or a
//! `\`-marked in-process check resolved through the [`ConditionRegistry`].
//!
//! Logical evaluation short-circuits left to right, which is observable
//! because child conditions may spawn processes.

pub mod builtin;

use crate::context::Context;
use crate::placeholders;
use grapnel_config::ConditionConfig;
use grapnel_core::{Error, Restriction, Result};
use indexmap::IndexMap;

/// In-process condition contract
pub trait ConditionCheck {
    /// Hooks this condition applies to (empty = everywhere)
    ///
    /// Used as a pre-filter: a condition that does not apply to the current
    /// hook is not evaluated and does not block the action.
    fn restriction(&self) -> Restriction {
        Restriction::empty()
    }

    /// Evaluate the condition
    ///
    /// # Errors
    ///
    /// Returns an error if a repository query fails; such failures are
    /// configuration/environment errors and are never coerced to a boolean.
    fn is_true(&self, ctx: &Context<'_>) -> Result<bool>;
}

/// Factory constructing a condition check from its positional arguments
pub type ConditionFactory =
    Box<dyn Fn(&[serde_json::Value]) -> Result<Box<dyn ConditionCheck>> + Send + Sync>;

/// Registry mapping stable condition identifiers to factories
///
/// Unknown identifiers fail lookup with [`Error::ConditionUnresolvable`]
/// instead of a generic "class not found".
pub struct ConditionRegistry {
    factories: IndexMap<String, ConditionFactory>,
}

impl ConditionRegistry {
    /// Create a registry with no conditions
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Create a registry populated with the built-in conditions
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        builtin::register(&mut registry);
        registry
    }

    /// Register a condition factory under a stable identifier
    pub fn register(&mut self, name: impl Into<String>, factory: ConditionFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Resolve an identifier, constructing the check from `args`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConditionUnresolvable`] for unknown identifiers and
    /// propagates factory errors for malformed arguments.
    pub fn resolve(
        &self,
        name: &str,
        args: &[serde_json::Value],
    ) -> Result<Box<dyn ConditionCheck>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::ConditionUnresolvable {
                name: name.to_string(),
            })?;
        factory(args)
    }
}

/// Logical combinator kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    fn from_exec(exec: &str) -> Option<Self> {
        if exec.eq_ignore_ascii_case("and") {
            Some(LogicOp::And)
        } else if exec.eq_ignore_ascii_case("or") {
            Some(LogicOp::Or)
        } else {
            None
        }
    }
}

/// Evaluates condition trees against the run context
pub struct ConditionEvaluator<'a> {
    registry: &'a ConditionRegistry,
}

impl<'a> ConditionEvaluator<'a> {
    /// Create an evaluator backed by the given registry
    #[must_use]
    pub fn new(registry: &'a ConditionRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate an action's top-level condition list (implicit AND)
    ///
    /// An empty list is vacuously true.
    ///
    /// # Errors
    ///
    /// Returns an error for unresolvable conditions or failed repository
    /// queries.
    pub fn conditions_apply(
        &self,
        ctx: &Context<'_>,
        conditions: &[ConditionConfig],
    ) -> Result<bool> {
        for condition in conditions {
            if !self.evaluate(ctx, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluate a single condition tree
    ///
    /// # Errors
    ///
    /// Returns an error for unresolvable conditions or failed repository
    /// queries; a spawn failure of an external condition command is treated
    /// as `false`, not as an error.
    pub fn evaluate(&self, ctx: &Context<'_>, condition: &ConditionConfig) -> Result<bool> {
        if let Some(op) = LogicOp::from_exec(&condition.exec) {
            return self.evaluate_logic(ctx, op, condition);
        }

        if let Some(name) = condition.internal_name() {
            let check = self.registry.resolve(name, &condition.args)?;
            if !check.restriction().is_applicable_for(ctx.hook()) {
                tracing::debug!(
                    condition = name,
                    hook = %ctx.hook(),
                    "Condition not applicable for hook, treating as met"
                );
                return Ok(true);
            }
            return check.is_true(ctx);
        }

        run_external(ctx, &condition.exec)
    }

    fn evaluate_logic(
        &self,
        ctx: &Context<'_>,
        op: LogicOp,
        condition: &ConditionConfig,
    ) -> Result<bool> {
        let children = condition.nested()?;
        match op {
            LogicOp::And => {
                for child in &children {
                    if !self.evaluate(ctx, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicOp::Or => {
                for child in &children {
                    if self.evaluate(ctx, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Run an external condition command; true iff it exits 0
fn run_external(ctx: &Context<'_>, command: &str) -> Result<bool> {
    let rendered = placeholders::replace(ctx, command)?;
    let parts = shell_words::split(&rendered)
        .map_err(|e| Error::Config(format!("Failed to parse condition '{command}': {e}")))?;

    let Some((program, args)) = parts.split_first() else {
        return Err(Error::Config("Condition has an empty command".to_string()));
    };

    match duct::cmd(program, args)
        .dir(ctx.repository().workdir())
        .stdout_null()
        .stderr_null()
        .unchecked()
        .run()
    {
        Ok(output) => Ok(output.status.success()),
        Err(e) => {
            tracing::debug!(condition = command, error = %e, "Condition command failed to spawn");
            Ok(false)
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
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        result: bool,
        calls: Arc<AtomicUsize>,
    }

    impl ConditionCheck for Fixed {
        fn is_true(&self, _ctx: &Context<'_>) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result)
        }
    }

    struct Restricted;

    impl ConditionCheck for Restricted {
        fn restriction(&self) -> Restriction {
            Restriction::of([HookName::PrePush])
        }

        fn is_true(&self, _ctx: &Context<'_>) -> Result<bool> {
            Ok(false)
        }
    }

    fn counting_registry() -> (ConditionRegistry, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let true_calls = Arc::new(AtomicUsize::new(0));
        let false_calls = Arc::new(AtomicUsize::new(0));

        let mut registry = ConditionRegistry::empty();
        let calls = Arc::clone(&true_calls);
        registry.register(
            "test.true",
            Box::new(move |_args| {
                Ok(Box::new(Fixed {
                    result: true,
                    calls: Arc::clone(&calls),
                }) as Box<dyn ConditionCheck>)
            }),
        );
        let calls = Arc::clone(&false_calls);
        registry.register(
            "test.false",
            Box::new(move |_args| {
                Ok(Box::new(Fixed {
                    result: false,
                    calls: Arc::clone(&calls),
                }) as Box<dyn ConditionCheck>)
            }),
        );
        registry.register(
            "test.restricted",
            Box::new(|_args| Ok(Box::new(Restricted) as Box<dyn ConditionCheck>)),
        );

        (registry, true_calls, false_calls)
    }

    fn logic(op: &str, children: &[&str]) -> ConditionConfig {
        ConditionConfig::with_args(
            op,
            children
                .iter()
                .map(|exec| serde_json::json!({"exec": exec}))
                .collect(),
        )
    }

    fn eval(registry: &ConditionRegistry, hook: HookName, condition: &ConditionConfig) -> bool {
        let config = Config::default();
        let repository = FakeRepository::default();
        let io = NullIo::new();
        let ctx = Context::new(&config, &repository, &io, hook, RecursionGuard::new());
        ConditionEvaluator::new(registry)
            .evaluate(&ctx, condition)
            .unwrap()
    }

    #[test]
    fn test_and_short_circuits() {
        let (registry, true_calls, _false_calls) = counting_registry();
        let condition = logic("and", &["\\test.false", "\\test.true"]);

        assert!(!eval(&registry, HookName::PreCommit, &condition));
        // The second child is never evaluated
        assert_eq!(true_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_or_short_circuits() {
        let (registry, _true_calls, false_calls) = counting_registry();
        let condition = logic("or", &["\\test.true", "\\test.false"]);

        assert!(eval(&registry, HookName::PreCommit, &condition));
        assert_eq!(false_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_nested_logic() {
        let (registry, ..) = counting_registry();

        // and(true, or(false, true)) == true
        let condition = ConditionConfig::with_args(
            "and",
            vec![
                serde_json::json!({"exec": "\\test.true"}),
                serde_json::json!({
                    "exec": "or",
                    "args": [{"exec": "\\test.false"}, {"exec": "\\test.true"}]
                }),
            ],
        );

        assert!(eval(&registry, HookName::PreCommit, &condition));
    }

    #[test]
    fn test_unresolvable_condition_is_fatal() {
        let registry = ConditionRegistry::empty();
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

        let condition = ConditionConfig::new("\\no.such.condition");
        let result = ConditionEvaluator::new(&registry).evaluate(&ctx, &condition);
        assert!(matches!(
            result,
            Err(Error::ConditionUnresolvable { name }) if name == "no.such.condition"
        ));
    }

    #[test]
    fn test_restriction_pre_filter_treats_as_met() {
        let (registry, ..) = counting_registry();

        // Restricted to pre-push and always false; on pre-commit the
        // pre-filter kicks in and the condition does not block.
        let condition = ConditionConfig::new("\\test.restricted");
        assert!(eval(&registry, HookName::PreCommit, &condition));
        assert!(!eval(&registry, HookName::PrePush, &condition));
    }

    #[test]
    fn test_empty_condition_list_is_vacuously_true() {
        let (registry, ..) = counting_registry();
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

        assert!(
            ConditionEvaluator::new(&registry)
                .conditions_apply(&ctx, &[])
                .unwrap()
        );
    }

    #[test]
    fn test_external_condition_exit_codes() {
        let registry = ConditionRegistry::empty();
        assert!(eval(
            &registry,
            HookName::PreCommit,
            &ConditionConfig::new("true")
        ));
        assert!(!eval(
            &registry,
            HookName::PreCommit,
            &ConditionConfig::new("false")
        ));
    }

    #[test]
    fn test_external_condition_spawn_failure_is_false() {
        let registry = ConditionRegistry::empty();
        assert!(!eval(
            &registry,
            HookName::PreCommit,
            &ConditionConfig::new("grapnel-definitely-not-a-binary")
        ));
    }
}
