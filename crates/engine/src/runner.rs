//! Hook runner — the top-level orchestrator
//!
//! For one fired hook the runner checks the hook is enabled, resolves the
//! action list, wraps the run in the plugin lifecycle, applies restriction
//! filtering and condition evaluation per action, dispatches through the
//! [`ActionDispatcher`], and aggregates outcomes under the fail-fast or
//! collect-all policy.
//!
//! The state machine is `NotStarted → HookDisabled` (terminal) or
//! `NotStarted → Running → {AllSucceeded, SomeFailed}` (terminal).
//! Firing a virtual hook additionally runs the native hooks it aliases,
//! one level deep.

use crate::actions::{ActionDispatcher, ActionRegistry};
use crate::conditions::{ConditionEvaluator, ConditionRegistry};
use crate::context::{Context, RecursionGuard};
use crate::plugins::{PluginManager, PluginRegistry};
use crate::repository::Repository;
use grapnel_config::{Config, HookConfig};
use grapnel_core::{ActionLog, HookName, Io, Outcome, Result, RunLog, Verbosity};

/// Runner state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No hook has been processed yet
    NotStarted,
    /// Actions are being processed
    Running,
    /// The hook was not configured or disabled; nothing ran (terminal)
    HookDisabled,
    /// Every dispatched action succeeded (terminal)
    AllSucceeded,
    /// At least one action failed (terminal)
    SomeFailed,
}

/// Result of running a single hook configuration
#[derive(Debug)]
pub struct RunReport {
    /// The hook that ran
    pub hook: HookName,
    /// Terminal state of the run
    pub state: RunState,
    /// Per-action log
    pub log: RunLog,
}

impl RunReport {
    /// Whether the run should be considered successful by the caller
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state != RunState::SomeFailed
    }
}

/// Aggregated result of one `run` invocation
///
/// Contains one report per processed hook configuration: a single entry for
/// native hooks, the virtual hook's own report plus one per aliased native
/// hook otherwise.
#[derive(Debug, Default)]
pub struct RunSummary {
    reports: Vec<RunReport>,
}

impl RunSummary {
    /// All hook reports, in execution order
    #[must_use]
    pub fn reports(&self) -> &[RunReport] {
        &self.reports
    }

    /// Whether every processed hook succeeded
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.reports.iter().all(RunReport::succeeded)
    }
}

/// The hook execution orchestrator
///
/// Owns the per-run log and the plugin instances; borrows the configuration
/// and the repository/IO capabilities.
pub struct HookRunner<'a> {
    config: &'a Config,
    repository: &'a dyn Repository,
    io: &'a dyn Io,
    conditions: ConditionRegistry,
    actions: ActionRegistry,
    plugins: PluginManager,
    guard: RecursionGuard,
    state: RunState,
}

impl<'a> HookRunner<'a> {
    /// Create a runner with the built-in registries and the configured
    /// plugins
    ///
    /// # Errors
    ///
    /// Returns an error if a configured plugin cannot be resolved.
    pub fn new(
        config: &'a Config,
        repository: &'a dyn Repository,
        io: &'a dyn Io,
    ) -> Result<Self> {
        Self::builder(config, repository, io).build()
    }

    /// Create a builder for custom registries or plugins
    pub fn builder(
        config: &'a Config,
        repository: &'a dyn Repository,
        io: &'a dyn Io,
    ) -> HookRunnerBuilder<'a> {
        HookRunnerBuilder::new(config, repository, io)
    }

    /// The state the machine ended in after the last processed hook
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the given hook
    ///
    /// A virtual hook runs its own configuration first, then each native
    /// hook it aliases; under fail-on-first-error the expansion stops at
    /// the first failing hook. When the recursion guard is held the
    /// invocation is suppressed entirely and the summary is empty.
    ///
    /// # Errors
    ///
    /// Returns an error for fatal problems: unresolvable conditions,
    /// actions or plugins, plugin callback failures, or a failed
    /// working-tree restore. Ordinary action failures are reported through
    /// the summary instead.
    #[tracing::instrument(skip(self), fields(hook = %hook))]
    pub fn run(&mut self, hook: HookName) -> Result<RunSummary> {
        if self.guard.is_active() {
            tracing::debug!("Hook invocation suppressed by recursion guard");
            self.io.write(
                &format!("'{hook}' suppressed by recursion guard"),
                Verbosity::Debug,
            );
            return Ok(RunSummary::default());
        }

        let mut reports = vec![self.run_hook(hook)?];

        // One level of alias expansion, no further aliasing
        if hook.is_virtual() {
            for &native in hook.aliased_hooks() {
                if self.config.settings.fail_on_first_error
                    && reports.iter().any(|r| !r.succeeded())
                {
                    tracing::debug!("Stopping alias expansion after failed hook");
                    break;
                }
                reports.push(self.run_hook(native)?);
            }
        }

        Ok(RunSummary { reports })
    }

    /// Run one hook configuration through the state machine
    fn run_hook(&mut self, hook: HookName) -> Result<RunReport> {
        self.state = RunState::NotStarted;

        let Some(hook_config) = self.config.hook(hook) else {
            self.io
                .write(&format!("'{hook}' is not configured, skipping"), Verbosity::Verbose);
            self.state = RunState::HookDisabled;
            return Ok(RunReport {
                hook,
                state: self.state,
                log: RunLog::new(hook),
            });
        };

        if !hook_config.enabled {
            self.io
                .write(&format!("'{hook}' is disabled, skipping"), Verbosity::Normal);
            self.state = RunState::HookDisabled;
            return Ok(RunReport {
                hook,
                state: self.state,
                log: RunLog::new(hook),
            });
        }

        self.state = RunState::Running;
        tracing::debug!(actions = hook_config.actions.len(), "Running hook");

        let mut ctx = Context::new(
            self.config,
            self.repository,
            self.io,
            hook,
            self.guard.clone(),
        );
        let mut log = RunLog::new(hook);

        self.plugins.activate(hook);

        let result = match self.plugins.before_hook(&mut ctx) {
            Ok(()) => run_actions(
                self.io,
                &self.conditions,
                &self.actions,
                &mut self.plugins,
                self.config.settings.fail_on_first_error,
                &mut ctx,
                hook_config,
                &mut log,
            ),
            Err(e) => Err(e),
        };

        // Cleanup plugins (e.g. working-tree restoration) always fire,
        // even when the action loop aborted.
        let after = self.plugins.after_hook(&mut ctx, &log);

        if let Err(after_err) = after {
            if result.is_ok() {
                return Err(after_err);
            }
            tracing::error!(error = %after_err, "After-hook cleanup failed");
        }
        result?;

        self.state = if log.has_failures() {
            RunState::SomeFailed
        } else {
            RunState::AllSucceeded
        };

        Ok(RunReport {
            hook,
            state: self.state,
            log,
        })
    }
}

/// The per-action loop of a running hook
#[allow(clippy::too_many_arguments)]
fn run_actions(
    io: &dyn Io,
    conditions: &ConditionRegistry,
    actions: &ActionRegistry,
    plugins: &mut PluginManager,
    fail_fast: bool,
    ctx: &mut Context<'_>,
    hook_config: &HookConfig,
    log: &mut RunLog,
) -> Result<()> {
    let evaluator = ConditionEvaluator::new(conditions);
    let dispatcher = ActionDispatcher::new(actions);

    for action in &hook_config.actions {
        // Restriction filtering: not an action outcome, not logged
        if !dispatcher.restriction_of(action)?.is_applicable_for(ctx.hook()) {
            tracing::debug!(action = %action.action, "Action not applicable for hook");
            continue;
        }

        // A plugin asked to skip the rest of the run
        if ctx.skip_requested() {
            deactivate(io, plugins, ctx, log, &action.action)?;
            continue;
        }

        // Conditions are never fatal for the action: false means skipped
        if !evaluator.conditions_apply(ctx, &action.conditions)? {
            let entry = ActionLog::new(&action.action, Outcome::Skipped)
                .with_message(Verbosity::Verbose, "conditions not met");
            write_outcome(io, &entry);
            log.add(entry);
            continue;
        }

        plugins.before_action(ctx, action)?;
        if ctx.skip_requested() {
            deactivate(io, plugins, ctx, log, &action.action)?;
            continue;
        }

        let entry = dispatcher.execute(ctx, action)?;
        let failed = entry.failed();
        write_outcome(io, &entry);
        log.add(entry);

        if let Some(last) = log.last() {
            plugins.after_action(ctx, last)?;
        }

        if failed && fail_fast {
            tracing::debug!(action = %action.action, "Stopping run after failed action");
            break;
        }
    }

    Ok(())
}

/// Mark an action deactivated and run the per-action bookkeeping
fn deactivate(
    io: &dyn Io,
    plugins: &mut PluginManager,
    ctx: &mut Context<'_>,
    log: &mut RunLog,
    action: &str,
) -> Result<()> {
    let entry = ActionLog::new(action, Outcome::Deactivated)
        .with_message(Verbosity::Verbose, "deactivated by plugin");
    write_outcome(io, &entry);
    log.add(entry);

    if let Some(last) = log.last() {
        plugins.after_action(ctx, last)?;
    }
    Ok(())
}

fn write_outcome(io: &dyn Io, entry: &ActionLog) {
    io.write(
        &format!("  [{}] {}", entry.outcome.label(), entry.action),
        Verbosity::Normal,
    );
}

/// Builder for a [`HookRunner`] with custom registries, plugins or guard
pub struct HookRunnerBuilder<'a> {
    config: &'a Config,
    repository: &'a dyn Repository,
    io: &'a dyn Io,
    conditions: ConditionRegistry,
    actions: ActionRegistry,
    plugin_registry: PluginRegistry,
    plugins: Option<PluginManager>,
    guard: RecursionGuard,
}

impl<'a> HookRunnerBuilder<'a> {
    /// Create a builder with the built-in registries
    pub fn new(config: &'a Config, repository: &'a dyn Repository, io: &'a dyn Io) -> Self {
        Self {
            config,
            repository,
            io,
            conditions: ConditionRegistry::builtin(),
            actions: ActionRegistry::builtin(),
            plugin_registry: PluginRegistry::builtin(),
            plugins: None,
            guard: RecursionGuard::new(),
        }
    }

    /// Replace the condition registry
    #[must_use]
    pub fn condition_registry(mut self, registry: ConditionRegistry) -> Self {
        self.conditions = registry;
        self
    }

    /// Replace the action registry
    #[must_use]
    pub fn action_registry(mut self, registry: ActionRegistry) -> Self {
        self.actions = registry;
        self
    }

    /// Replace the plugin registry used to instantiate configured plugins
    #[must_use]
    pub fn plugin_registry(mut self, registry: PluginRegistry) -> Self {
        self.plugin_registry = registry;
        self
    }

    /// Use pre-instantiated plugins instead of the configured ones
    #[must_use]
    pub fn plugins(mut self, plugins: PluginManager) -> Self {
        self.plugins = Some(plugins);
        self
    }

    /// Share a recursion guard with the caller
    #[must_use]
    pub fn recursion_guard(mut self, guard: RecursionGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Build the runner, instantiating configured plugins
    ///
    /// # Errors
    ///
    /// Returns an error if a configured plugin identifier cannot be
    /// resolved.
    pub fn build(self) -> Result<HookRunner<'a>> {
        let plugins = match self.plugins {
            Some(plugins) => plugins,
            None => PluginManager::from_config(
                &self.plugin_registry,
                &self.config.settings.plugins,
            )?,
        };

        Ok(HookRunner {
            config: self.config,
            repository: self.repository,
            io: self.io,
            conditions: self.conditions,
            actions: self.actions,
            plugins,
            guard: self.guard,
            state: RunState::NotStarted,
        })
    }
}
