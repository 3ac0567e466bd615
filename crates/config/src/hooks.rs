//! Hook configuration structures
//!
//! Defines the per-hook configuration types: hooks own an ordered action
//! list, actions own opaque options and a condition tree, plugins are
//! referenced by registry identifier.

use grapnel_core::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved marker distinguishing in-process handler references from
/// external command lines
pub const INTERNAL_MARKER: char = '\\';

/// Configuration of a single hook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Whether the hook runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Actions to run, in declared order
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            actions: Vec::new(),
        }
    }
}

impl HookConfig {
    /// Validate the hook configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any action is invalid.
    pub fn validate(&self) -> Result<()> {
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }
}

/// A single configured unit of work tied to a hook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// External command line, or in-process handler id with a leading `\`
    pub action: String,

    /// Opaque key/value pairs interpreted only by the action implementation
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, serde_json::Value>,

    /// Conditions gating whether the action runs (implicit AND)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionConfig>,
}

impl ActionConfig {
    /// Create an action with no options and no conditions
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            options: IndexMap::new(),
            conditions: Vec::new(),
        }
    }

    /// Check whether this references an in-process handler
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.action.starts_with(INTERNAL_MARKER)
    }

    /// The handler id with the marker stripped, for in-process actions
    #[must_use]
    pub fn internal_name(&self) -> Option<&str> {
        self.action.strip_prefix(INTERNAL_MARKER)
    }

    /// Look up a string option
    #[must_use]
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(serde_json::Value::as_str)
    }

    /// Look up an integer option
    #[must_use]
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(serde_json::Value::as_u64)
    }

    /// Validate the action configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the executable string is empty or a condition is
    /// malformed.
    pub fn validate(&self) -> Result<()> {
        if self.action.trim().is_empty() {
            return Err(Error::Config("Action has empty 'action' field".to_string()));
        }
        if self.is_internal() && self.internal_name().is_none_or(str::is_empty) {
            return Err(Error::Config(format!(
                "Action '{}' has an empty handler reference",
                self.action
            )));
        }
        for condition in &self.conditions {
            condition.validate()?;
        }
        Ok(())
    }
}

/// A boolean predicate gating an action
///
/// `exec` is either one of the logical markers `and`/`or`, an external
/// command, or a `\`-marked in-process condition id. For logical markers
/// the `args` list holds nested condition objects, making this a recursive
/// tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionConfig {
    /// Logical marker, external command, or in-process condition id
    pub exec: String,

    /// Positional arguments; nested conditions for logical markers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
}

impl ConditionConfig {
    /// Create a condition with no arguments
    #[must_use]
    pub fn new(exec: impl Into<String>) -> Self {
        Self {
            exec: exec.into(),
            args: Vec::new(),
        }
    }

    /// Create a condition with arguments
    #[must_use]
    pub fn with_args(exec: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            exec: exec.into(),
            args,
        }
    }

    /// Check whether this is an `and`/`or` combinator node
    #[must_use]
    pub fn is_logic(&self) -> bool {
        self.exec.eq_ignore_ascii_case("and") || self.exec.eq_ignore_ascii_case("or")
    }

    /// Check whether this references an in-process condition
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.exec.starts_with(INTERNAL_MARKER)
    }

    /// The condition id with the marker stripped, for in-process conditions
    #[must_use]
    pub fn internal_name(&self) -> Option<&str> {
        self.exec.strip_prefix(INTERNAL_MARKER)
    }

    /// Parse the nested child conditions of a logical combinator
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is not a condition-shaped object.
    pub fn nested(&self) -> Result<Vec<ConditionConfig>> {
        self.args
            .iter()
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    Error::Config(format!(
                        "Logical condition '{}' has a malformed child condition: {}",
                        self.exec, e
                    ))
                })
            })
            .collect()
    }

    /// Validate the condition tree
    ///
    /// # Errors
    ///
    /// Returns an error if an exec string is empty or a logical node has
    /// malformed children.
    pub fn validate(&self) -> Result<()> {
        if self.exec.trim().is_empty() {
            return Err(Error::Config(
                "Condition has empty 'exec' field".to_string(),
            ));
        }
        if self.is_logic() {
            if self.args.is_empty() {
                return Err(Error::Config(format!(
                    "Logical condition '{}' has no child conditions",
                    self.exec
                )));
            }
            for child in self.nested()? {
                child.validate()?;
            }
        }
        Ok(())
    }
}

/// Reference to a lifecycle plugin plus its options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Registry identifier of the plugin implementation
    pub plugin: String,

    /// Options handed to the plugin factory
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, serde_json::Value>,
}

pub(crate) fn default_enabled() -> bool {
    true
}
