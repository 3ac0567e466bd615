//! Built-in condition checks
//!
//! The file-staged family applies to pre-commit only; the file-changed
//! family applies to the working-tree changing hooks. Both share the small
//! path-matching helpers below instead of a common base type.

use super::{ConditionCheck, ConditionRegistry};
use crate::context::Context;
use grapnel_core::{Error, HookName, Restriction, Result};
use std::path::Path;

/// Register all built-in conditions
pub fn register(registry: &mut ConditionRegistry) {
    registry.register(
        "file-staged.of-type",
        Box::new(|args| {
            Ok(Box::new(FileStagedOfType {
                suffix: string_arg("file-staged.of-type", args, 0)?,
            }) as Box<dyn ConditionCheck>)
        }),
    );
    registry.register(
        "file-staged.any",
        Box::new(|args| {
            Ok(Box::new(FileStagedAny {
                paths: string_list("file-staged.any", args)?,
            }) as Box<dyn ConditionCheck>)
        }),
    );
    registry.register(
        "file-staged.in-dir",
        Box::new(|args| {
            Ok(Box::new(FileStagedInDir {
                dir: string_arg("file-staged.in-dir", args, 0)?,
            }) as Box<dyn ConditionCheck>)
        }),
    );
    registry.register(
        "file-changed.any",
        Box::new(|args| {
            Ok(Box::new(FileChangedAny {
                paths: string_list("file-changed.any", args)?,
            }) as Box<dyn ConditionCheck>)
        }),
    );
    registry.register(
        "file-changed.of-type",
        Box::new(|args| {
            Ok(Box::new(FileChangedOfType {
                suffix: string_arg("file-changed.of-type", args, 0)?,
            }) as Box<dyn ConditionCheck>)
        }),
    );
    registry.register(
        "branch.on",
        Box::new(|args| {
            Ok(Box::new(BranchOn {
                branch: string_arg("branch.on", args, 0)?,
            }) as Box<dyn ConditionCheck>)
        }),
    );
}

/// Check whether a path has the given extension (leading dot optional)
fn matches_type(path: &Path, suffix: &str) -> bool {
    let wanted = suffix.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// Check whether a path lives under the given directory prefix
fn in_directory(path: &Path, dir: &str) -> bool {
    path.starts_with(dir.trim_end_matches('/'))
}

/// Restriction shared by the file-staged family
fn staged_restriction() -> Restriction {
    Restriction::of([HookName::PreCommit])
}

/// Restriction shared by the file-changed family
fn changed_restriction() -> Restriction {
    Restriction::of([HookName::PostChange])
}

fn string_arg(name: &'static str, args: &[serde_json::Value], index: usize) -> Result<String> {
    args.get(index)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Config(format!(
                "Condition '{name}' requires a string argument at position {index}"
            ))
        })
}

fn string_list(name: &'static str, args: &[serde_json::Value]) -> Result<Vec<String>> {
    let mut list = Vec::new();
    for arg in args {
        match arg {
            serde_json::Value::String(s) => list.push(s.clone()),
            serde_json::Value::Array(items) => {
                for item in items {
                    let s = item.as_str().ok_or_else(|| {
                        Error::Config(format!("Condition '{name}' expects string paths"))
                    })?;
                    list.push(s.to_string());
                }
            }
            _ => {
                return Err(Error::Config(format!(
                    "Condition '{name}' expects string paths"
                )));
            }
        }
    }
    if list.is_empty() {
        return Err(Error::Config(format!(
            "Condition '{name}' requires at least one path"
        )));
    }
    Ok(list)
}

/// True if any staged file has the given extension
struct FileStagedOfType {
    suffix: String,
}

impl ConditionCheck for FileStagedOfType {
    fn restriction(&self) -> Restriction {
        staged_restriction()
    }

    fn is_true(&self, ctx: &Context<'_>) -> Result<bool> {
        let staged = ctx.repository().staged_files()?;
        Ok(staged.iter().any(|path| matches_type(path, &self.suffix)))
    }
}

/// True if any of the listed paths is staged
struct FileStagedAny {
    paths: Vec<String>,
}

impl ConditionCheck for FileStagedAny {
    fn restriction(&self) -> Restriction {
        staged_restriction()
    }

    fn is_true(&self, ctx: &Context<'_>) -> Result<bool> {
        let staged = ctx.repository().staged_files()?;
        Ok(staged
            .iter()
            .any(|path| self.paths.iter().any(|p| Path::new(p) == path)))
    }
}

/// True if any staged file lives under the given directory
struct FileStagedInDir {
    dir: String,
}

impl ConditionCheck for FileStagedInDir {
    fn restriction(&self) -> Restriction {
        staged_restriction()
    }

    fn is_true(&self, ctx: &Context<'_>) -> Result<bool> {
        let staged = ctx.repository().staged_files()?;
        Ok(staged.iter().any(|path| in_directory(path, &self.dir)))
    }
}

/// True if any of the listed paths changed in the triggering ref move
struct FileChangedAny {
    paths: Vec<String>,
}

impl ConditionCheck for FileChangedAny {
    fn restriction(&self) -> Restriction {
        changed_restriction()
    }

    fn is_true(&self, ctx: &Context<'_>) -> Result<bool> {
        let changed = ctx.changed_files()?;
        Ok(changed
            .iter()
            .any(|path| self.paths.iter().any(|p| Path::new(p) == path)))
    }
}

/// True if any file of the given type changed in the triggering ref move
struct FileChangedOfType {
    suffix: String,
}

impl ConditionCheck for FileChangedOfType {
    fn restriction(&self) -> Restriction {
        changed_restriction()
    }

    fn is_true(&self, ctx: &Context<'_>) -> Result<bool> {
        let changed = ctx.changed_files()?;
        Ok(changed.iter().any(|path| matches_type(path, &self.suffix)))
    }
}

/// True if the repository is on the given branch
struct BranchOn {
    branch: String,
}

impl ConditionCheck for BranchOn {
    fn is_true(&self, ctx: &Context<'_>) -> Result<bool> {
        Ok(ctx.repository().current_branch()? == self.branch)
    }
}
