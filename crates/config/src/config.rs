//! Top-level configuration file handling
//!
//! `grapnel.json` maps hook names to [`HookConfig`] entries; engine
//! settings live under the reserved `"config"` key. Hook names are
//! validated against the enumeration when the file is loaded, before any
//! plugin or action runs.

use crate::hooks::{HookConfig, PluginConfig};
use grapnel_core::{Error, HookName, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, relative to the repository root
pub const CONFIG_FILE: &str = "grapnel.json";

/// The complete grapnel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings from the reserved `"config"` key
    #[serde(rename = "config", default)]
    pub settings: Settings,

    /// Hook configurations, keyed by hook name
    #[serde(flatten)]
    hooks: IndexMap<String, HookConfig>,
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Stop on the first failing action instead of collecting all errors
    #[serde(rename = "fail-on-first-error", default = "default_fail_on_first_error")]
    pub fail_on_first_error: bool,

    /// Git repository location, when not the config file's directory
    #[serde(rename = "git-directory", default, skip_serializing_if = "Option::is_none")]
    pub git_directory: Option<PathBuf>,

    /// Default output verbosity (`normal`, `verbose`, `debug`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,

    /// User-defined settings, reachable via the `CONFIG` placeholder
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom: IndexMap<String, String>,

    /// Lifecycle plugins, in registration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fail_on_first_error: default_fail_on_first_error(),
            git_directory: None,
            verbosity: None,
            custom: IndexMap::new(),
            plugins: Vec::new(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// contains an unknown hook name.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or validation fails.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate hook names and nested action/condition configuration
    ///
    /// # Errors
    ///
    /// Returns an error for unknown hook names or malformed entries.
    pub fn validate(&self) -> Result<()> {
        for (name, hook) in &self.hooks {
            let _: HookName = name.parse()?;
            hook.validate().map_err(|e| {
                Error::Config(format!("Invalid configuration for hook '{name}': {e}"))
            })?;
        }
        Ok(())
    }

    /// Look up the configuration for a hook
    #[must_use]
    pub fn hook(&self, hook: HookName) -> Option<&HookConfig> {
        self.hooks.get(hook.as_str())
    }

    /// Check whether a hook is configured and enabled
    #[must_use]
    pub fn is_enabled(&self, hook: HookName) -> bool {
        self.hook(hook).is_some_and(|h| h.enabled)
    }

    /// Iterate over all configured hooks in declaration order
    pub fn hooks(&self) -> impl Iterator<Item = (HookName, &HookConfig)> {
        self.hooks
            .iter()
            .filter_map(|(name, hook)| name.parse::<HookName>().ok().map(|n| (n, hook)))
    }

    /// Resolve a `CONFIG` placeholder path
    ///
    /// Supports the named settings plus the `custom>>key` escape for
    /// user-defined values.
    #[must_use]
    pub fn value_of(&self, path: &str) -> Option<String> {
        if let Some(key) = path.strip_prefix("custom>>") {
            return self.settings.custom.get(key).cloned();
        }
        match path {
            "fail-on-first-error" => Some(self.settings.fail_on_first_error.to_string()),
            "git-directory" => self
                .settings
                .git_directory
                .as_ref()
                .map(|p| p.display().to_string()),
            "verbosity" => self.settings.verbosity.clone(),
            _ => None,
        }
    }
}

pub(crate) fn default_fail_on_first_error() -> bool {
    true
}
