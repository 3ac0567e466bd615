//! Hook execution engine for grapnel
//!
//! Given a fired git hook name, the engine resolves the configured actions,
//! evaluates per-action conditions (including AND/OR trees), dispatches each
//! action to the correct executor (external process or in-process handler),
//! invokes ordered lifecycle plugins around the hook and around each action,
//! and enforces the fail-fast vs. collect-all run policy.
//!
//! ## Execution model
//!
//! - One hook run processes one action at a time; there is no parallel
//!   action execution and no timeout — a hung action hangs the hook.
//! - The git index and working tree are shared with every spawned action;
//!   the engine relies on git's single-writer model and on the
//!   working-tree preservation plugin's save/restore discipline.
//! - A run-scoped recursion guard prevents the plugin's own `git checkout`
//!   from re-entering hook processing.
//!
//! ## Module organization
//!
//! - `runner`: the top-level orchestrator and its state machine
//! - `conditions`: condition evaluation and the built-in condition registry
//! - `actions`: action dispatch and the built-in handler registry
//! - `plugins`: lifecycle plugin contract, manager and built-in plugins
//! - `placeholders`: `{$NAME|option:value}` substitution for command lines
//! - `repository`: the git capability trait and its git2 implementation
//! - `installer`: hook script installation into `.git/hooks`

pub mod actions;
pub mod conditions;
pub mod context;
pub mod installer;
pub mod placeholders;
pub mod plugins;
pub mod repository;
pub mod runner;

pub use actions::{ActionDispatcher, ActionRegistry, ActionRunner};
pub use conditions::{ConditionCheck, ConditionEvaluator, ConditionRegistry};
pub use context::{Context, RecursionGuard};
pub use installer::Installer;
pub use plugins::{Plugin, PluginManager, PluginRegistry};
pub use repository::{Git2Repository, Repository};
pub use runner::{HookRunner, HookRunnerBuilder, RunReport, RunState, RunSummary};
