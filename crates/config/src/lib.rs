//! Configuration loading for grapnel
//!
//! The configuration lives in a single JSON file (`grapnel.json` by
//! default) at the repository root. Hook names are top-level keys; engine
//! settings live under the reserved `"config"` key:
//!
//! ```json
//! {
//!   "config": {
//!     "fail-on-first-error": true,
//!     "plugins": [{"plugin": "preserve-working-tree"}]
//!   },
//!   "pre-commit": {
//!     "enabled": true,
//!     "actions": [
//!       {
//!         "action": "cargo fmt --check",
//!         "conditions": [{"exec": "\\file-staged.of-type", "args": ["rs"]}]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! The configuration is loaded once per run and never mutated during
//! execution.

pub mod config;
pub mod hooks;

pub use config::{Config, Settings};
pub use hooks::{ActionConfig, ConditionConfig, HookConfig, PluginConfig};
