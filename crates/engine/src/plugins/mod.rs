//! Lifecycle plugins
//!
//! Plugins observe and modify a hook run through four ordered callbacks:
//! `before_hook`, `before_action`, `after_action`, `after_hook`. They are
//! trusted infrastructure — a callback error aborts the whole run.

pub mod preserve;

use crate::context::Context;
use grapnel_config::{ActionConfig, PluginConfig};
use grapnel_core::{ActionLog, Error, HookName, Restriction, Result, RunLog};
use indexmap::IndexMap;

/// Lifecycle observer contract
///
/// All callbacks default to no-ops so plugins implement only what they
/// need. `before_hook` and `before_action` may request that remaining
/// actions be skipped via [`Context::request_skip`].
pub trait Plugin {
    /// Hooks this plugin applies to (empty = everywhere)
    fn restriction(&self) -> Restriction {
        Restriction::empty()
    }

    /// Called once before the first action
    fn before_hook(&mut self, _ctx: &mut Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Called before each action is dispatched
    fn before_action(&mut self, _ctx: &mut Context<'_>, _action: &ActionConfig) -> Result<()> {
        Ok(())
    }

    /// Called after each action, including deactivated ones
    fn after_action(&mut self, _ctx: &mut Context<'_>, _log: &ActionLog) -> Result<()> {
        Ok(())
    }

    /// Called once after the last action, even when an action failed
    fn after_hook(&mut self, _ctx: &mut Context<'_>, _log: &RunLog) -> Result<()> {
        Ok(())
    }
}

/// Factory constructing a plugin from its configured options
pub type PluginFactory =
    Box<dyn Fn(&IndexMap<String, serde_json::Value>) -> Result<Box<dyn Plugin>> + Send + Sync>;

/// Registry mapping stable plugin identifiers to factories
pub struct PluginRegistry {
    factories: IndexMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Create a registry with no plugins
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Create a registry populated with the built-in plugins
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "preserve-working-tree",
            Box::new(|_options| {
                Ok(Box::new(preserve::PreserveWorkingTree::new()) as Box<dyn Plugin>)
            }),
        );
        registry
    }

    /// Register a plugin factory under a stable identifier
    pub fn register(&mut self, name: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Resolve an identifier, constructing the plugin from its options
    ///
    /// # Errors
    ///
    /// Returns [`Error::PluginUnresolvable`] for unknown identifiers.
    pub fn resolve(
        &self,
        name: &str,
        options: &IndexMap<String, serde_json::Value>,
    ) -> Result<Box<dyn Plugin>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::PluginUnresolvable {
                name: name.to_string(),
            })?;
        factory(options)
    }
}

/// Holds the ordered plugin instances and fans out lifecycle callbacks
///
/// Restriction filtering happens once per run via [`PluginManager::activate`],
/// not per callback.
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    active: Vec<usize>,
}

impl PluginManager {
    /// Create a manager over already-instantiated plugins
    #[must_use]
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        let active = (0..plugins.len()).collect();
        Self { plugins, active }
    }

    /// Instantiate all configured plugins, in registration order
    ///
    /// # Errors
    ///
    /// Returns an error if a plugin identifier cannot be resolved; this
    /// happens before any lifecycle callback fires.
    pub fn from_config(registry: &PluginRegistry, configs: &[PluginConfig]) -> Result<Self> {
        let plugins = configs
            .iter()
            .map(|config| registry.resolve(&config.plugin, &config.options))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(plugins))
    }

    /// Number of registered plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check whether no plugins are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Filter plugins by restriction for the given hook
    pub fn activate(&mut self, hook: HookName) {
        self.active = self
            .plugins
            .iter()
            .enumerate()
            .filter(|(_, plugin)| plugin.restriction().is_applicable_for(hook))
            .map(|(index, _)| index)
            .collect();
    }

    /// Run all active plugins' `before_hook` in registration order
    pub fn before_hook(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        for index in self.active.clone() {
            self.plugins[index].before_hook(ctx)?;
        }
        Ok(())
    }

    /// Run all active plugins' `before_action` in registration order
    pub fn before_action(&mut self, ctx: &mut Context<'_>, action: &ActionConfig) -> Result<()> {
        for index in self.active.clone() {
            self.plugins[index].before_action(ctx, action)?;
        }
        Ok(())
    }

    /// Run all active plugins' `after_action` in registration order
    pub fn after_action(&mut self, ctx: &mut Context<'_>, log: &ActionLog) -> Result<()> {
        for index in self.active.clone() {
            self.plugins[index].after_action(ctx, log)?;
        }
        Ok(())
    }

    /// Run all active plugins' `after_hook` in registration order
    pub fn after_hook(&mut self, ctx: &mut Context<'_>, log: &RunLog) -> Result<()> {
        for index in self.active.clone() {
            self.plugins[index].after_hook(ctx, log)?;
        }
        Ok(())
    }
}
