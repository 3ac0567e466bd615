//! Placeholder substitution for external command lines
//!
//! Commands may embed tokens of the form `{$NAME|option:value|...}` which
//! are resolved against the run context before the command is spawned:
//!
//! - `STAGED_FILES`, `CHANGED_FILES`, `BRANCH_FILES` — file lists, with the
//!   shared options `of-type`, `in-dir`, `separated-by`, `replace`/`with`
//! - `ARG` — original hook invocation argument (`value-of`, `default`)
//! - `ENV` — environment variable (`value-of`, `default`)
//! - `CONFIG` — configuration value (`value-of`, including the
//!   `custom>>key` escape)
//! - `STDIN` — the hook's standard input, shell-escaped

use crate::context::Context;
use grapnel_core::Result;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\$([A-Z_]+)((?:\|[^|{}]+)*)\}").expect("placeholder pattern is valid")
});

/// Resolve all placeholder tokens in a command line
///
/// Unknown placeholder names are left untouched so a typo shows up in the
/// spawned command instead of vanishing silently.
///
/// # Errors
///
/// Returns an error if a repository query behind a placeholder fails.
pub fn replace(ctx: &Context<'_>, input: &str) -> Result<String> {
    if !input.contains("{$") {
        return Ok(input.to_string());
    }

    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(input) {
        let whole = caps.get(0).expect("capture group 0 is the whole match");
        out.push_str(&input[last..whole.start()]);

        let name = &caps[1];
        let options = parse_options(caps.get(2).map_or("", |m| m.as_str()));

        match resolve(ctx, name, &options)? {
            Some(value) => out.push_str(&value),
            None => {
                tracing::warn!(placeholder = name, "Unknown placeholder left unchanged");
                out.push_str(whole.as_str());
            }
        }

        last = whole.end();
    }

    out.push_str(&input[last..]);
    Ok(out)
}

/// Parse `|key:value` pairs into an ordered option map
fn parse_options(raw: &str) -> IndexMap<String, String> {
    raw.split('|')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            part.split_once(':')
                .map(|(key, value)| (key.to_string(), value.to_string()))
        })
        .collect()
}

fn resolve(
    ctx: &Context<'_>,
    name: &str,
    options: &IndexMap<String, String>,
) -> Result<Option<String>> {
    let value = match name {
        "STAGED_FILES" => file_list(ctx.repository().staged_files()?, options),
        "CHANGED_FILES" => file_list(ctx.changed_files()?, options),
        "BRANCH_FILES" => {
            let base = options.get("compared-to").map_or("main", String::as_str);
            file_list(ctx.repository().branch_files(base)?, options)
        }
        "ARG" => options
            .get("value-of")
            .and_then(|arg| ctx.io().argument(arg))
            .map(str::to_string)
            .or_else(|| options.get("default").cloned())
            .unwrap_or_default(),
        "ENV" => options
            .get("value-of")
            .and_then(|var| std::env::var(var).ok())
            .or_else(|| options.get("default").cloned())
            .unwrap_or_default(),
        "CONFIG" => options
            .get("value-of")
            .and_then(|path| ctx.config().value_of(path))
            .or_else(|| options.get("default").cloned())
            .unwrap_or_default(),
        "STDIN" => {
            let joined = ctx
                .io()
                .standard_input()
                .lines()
                .collect::<Vec<_>>()
                .join("\n");
            shell_words::quote(&joined).into_owned()
        }
        _ => return Ok(None),
    };

    Ok(Some(value))
}

/// Format a file list applying the shared option grammar
fn file_list(files: Vec<PathBuf>, options: &IndexMap<String, String>) -> String {
    let mut items: Vec<String> = files
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    if let Some(ext) = options.get("of-type") {
        let suffix = format!(".{}", ext.trim_start_matches('.'));
        items.retain(|item| item.ends_with(&suffix));
    }

    if let Some(dir) = options.get("in-dir") {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        items.retain(|item| item.starts_with(&prefix));
    }

    if let (Some(needle), Some(replacement)) = (options.get("replace"), options.get("with")) {
        items = items
            .iter()
            .map(|item| item.replace(needle.as_str(), replacement))
            .collect();
    }

    let separator = options.get("separated-by").map_or(" ", String::as_str);
    items.join(separator)
}
