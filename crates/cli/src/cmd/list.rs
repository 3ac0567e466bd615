//! List configured hooks

use crate::error::{CommandError, Result};
use grapnel_config::Config;
use owo_colors::OwoColorize;

/// List all configured hooks and their actions
pub fn run(config: &Config, format: &str) -> Result<()> {
    match format {
        "json" => {
            let hooks: Vec<serde_json::Value> = config
                .hooks()
                .map(|(name, hook)| {
                    serde_json::json!({
                        "hook": name.as_str(),
                        "enabled": hook.enabled,
                        "actions": hook.actions,
                    })
                })
                .collect();

            let json = serde_json::json!({ "hooks": hooks });
            let rendered = serde_json::to_string_pretty(&json)
                .map_err(|e| CommandError::Other(e.into()))?;
            println!("{rendered}");
        }
        _ => {
            let mut any = false;
            for (name, hook) in config.hooks() {
                any = true;
                if hook.enabled {
                    println!(
                        "{} ({} actions)",
                        name.to_string().green(),
                        hook.actions.len()
                    );
                } else {
                    println!(
                        "{} ({} actions) {}",
                        name.to_string().dimmed(),
                        hook.actions.len(),
                        "[disabled]".dimmed()
                    );
                }

                for action in &hook.actions {
                    println!("  • {}", action.action);
                }
            }

            if !any {
                println!("{}", "No hooks configured.".yellow());
            }
        }
    }

    Ok(())
}
