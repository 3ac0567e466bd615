//! Hook name enumeration and restriction sets
//!
//! Git only ever fires the native hooks. Virtual hooks are configuration
//! aliases that expand to one or more native hooks through a fixed, static
//! table; alias expansion is a single level deep.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A git hook identifier, validated against the enumeration at every entry
/// point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum HookName {
    /// Runs before a commit is created
    PreCommit,
    /// Runs to tweak the default commit message
    PrepareCommitMsg,
    /// Runs to validate the commit message
    CommitMsg,
    /// Runs after a commit has been created
    PostCommit,
    /// Runs before refs are pushed
    PrePush,
    /// Runs after a checkout or branch switch
    PostCheckout,
    /// Runs after a merge completes
    PostMerge,
    /// Runs after commits are rewritten (rebase, amend)
    PostRewrite,
    /// Virtual hook covering every working-tree changing hook
    ///
    /// Expands to post-checkout, post-merge and post-rewrite.
    PostChange,
}

impl HookName {
    /// All native hooks, in installation order
    pub const NATIVE: [HookName; 8] = [
        HookName::PreCommit,
        HookName::PrepareCommitMsg,
        HookName::CommitMsg,
        HookName::PostCommit,
        HookName::PrePush,
        HookName::PostCheckout,
        HookName::PostMerge,
        HookName::PostRewrite,
    ];

    /// Every hook name, native and virtual
    pub const ALL: [HookName; 9] = [
        HookName::PreCommit,
        HookName::PrepareCommitMsg,
        HookName::CommitMsg,
        HookName::PostCommit,
        HookName::PrePush,
        HookName::PostCheckout,
        HookName::PostMerge,
        HookName::PostRewrite,
        HookName::PostChange,
    ];

    /// Get the string name of this hook
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookName::PreCommit => "pre-commit",
            HookName::PrepareCommitMsg => "prepare-commit-msg",
            HookName::CommitMsg => "commit-msg",
            HookName::PostCommit => "post-commit",
            HookName::PrePush => "pre-push",
            HookName::PostCheckout => "post-checkout",
            HookName::PostMerge => "post-merge",
            HookName::PostRewrite => "post-rewrite",
            HookName::PostChange => "post-change",
        }
    }

    /// Check whether this is a virtual (alias) hook
    #[must_use]
    pub fn is_virtual(self) -> bool {
        !self.aliased_hooks().is_empty()
    }

    /// Native hooks this virtual hook expands to (empty for native hooks)
    #[must_use]
    pub fn aliased_hooks(self) -> &'static [HookName] {
        match self {
            HookName::PostChange => &[
                HookName::PostCheckout,
                HookName::PostMerge,
                HookName::PostRewrite,
            ],
            _ => &[],
        }
    }

    /// Names of the positional arguments git passes to this hook
    ///
    /// Used to map the argv of an installed hook script to named arguments
    /// accessible through [`crate::Io::argument`].
    #[must_use]
    pub fn argument_names(self) -> &'static [&'static str] {
        match self {
            HookName::PrepareCommitMsg => &["message-file", "mode", "hash"],
            HookName::CommitMsg => &["message-file"],
            HookName::PrePush => &["remote", "url"],
            HookName::PostCheckout => &["previous-head", "new-head", "branch-checkout"],
            HookName::PostMerge => &["squash"],
            HookName::PostRewrite => &["mode"],
            _ => &[],
        }
    }

    /// Check whether git feeds this hook data on standard input
    #[must_use]
    pub fn receives_stdin(self) -> bool {
        matches!(self, HookName::PrePush | HookName::PostRewrite)
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookName::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| Error::InvalidHookName {
                name: s.to_string(),
            })
    }
}

/// The set of hooks for which an action, condition or plugin is applicable
///
/// An empty restriction means "applicable everywhere". Adding a virtual hook
/// implicitly adds all the native hooks it aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restriction {
    hooks: BTreeSet<HookName>,
}

impl Restriction {
    /// Create an empty restriction (applicable to every hook)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a restriction covering the given hooks
    #[must_use]
    pub fn of(hooks: impl IntoIterator<Item = HookName>) -> Self {
        let mut restriction = Self::default();
        for hook in hooks {
            restriction.add(hook);
        }
        restriction
    }

    /// Add a hook, expanding virtual hooks to their native aliases
    pub fn add(&mut self, hook: HookName) {
        self.hooks.insert(hook);
        for alias in hook.aliased_hooks() {
            self.hooks.insert(*alias);
        }
    }

    /// Check whether the restriction applies to the given hook
    #[must_use]
    pub fn is_applicable_for(&self, hook: HookName) -> bool {
        self.hooks.is_empty() || self.hooks.contains(&hook)
    }

    /// Check whether no hooks are restricted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
