//! Show detailed information about a single hook

use crate::error::Result;
use grapnel_config::Config;
use grapnel_core::HookName;
use owo_colors::OwoColorize;

/// Print the full configuration of one hook
pub fn run(config: &Config, hook_name: &str) -> Result<()> {
    let hook: HookName = hook_name.parse()?;

    println!();
    println!("{} {}", "Hook:".bold(), hook.to_string().cyan());

    if hook.is_virtual() {
        let aliases: Vec<&str> = hook.aliased_hooks().iter().map(|h| h.as_str()).collect();
        println!("{} {}", "Aliases:".bold(), aliases.join(", "));
    }

    let Some(hook_config) = config.hook(hook) else {
        println!("{} not configured", "Status:".bold());
        println!();
        return Ok(());
    };

    let status = if hook_config.enabled {
        "enabled".green().to_string()
    } else {
        "disabled".yellow().to_string()
    };
    println!("{} {status}", "Status:".bold());
    println!("{} {}", "Actions:".bold(), hook_config.actions.len());

    for action in &hook_config.actions {
        println!();
        println!("  {}", action.action.cyan());
        if action.is_internal() {
            println!("    kind: in-process handler");
        } else {
            println!("    kind: external command");
        }

        if !action.options.is_empty() {
            println!("    options:");
            for (key, value) in &action.options {
                println!("      {key} = {value}");
            }
        }

        if !action.conditions.is_empty() {
            println!("    conditions:");
            for condition in &action.conditions {
                println!("      {}", condition.exec);
            }
        }
    }

    println!();
    Ok(())
}
