//! End-to-end runner tests against a real git repository
//!
//! These exercise the full path: config → runner → condition evaluation →
//! external process dispatch, using marker files to observe which commands
//! actually ran.

#![allow(clippy::unwrap_used, clippy::panic)]

use grapnel_config::Config;
use grapnel_core::{HookName, NullIo, Outcome};
use grapnel_engine::repository::Git2Repository;
use grapnel_engine::runner::{HookRunner, RunState};
use std::fs;
use std::path::Path;

fn init_repo(dir: &Path) {
    let repo = git2::Repository::init(dir).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }

    fs::write(dir.join("tracked.txt"), "content\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("tracked.txt")).unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
        .unwrap();
}

fn run(dir: &Path, config_json: &str, hook: HookName) -> (RunState, Vec<Outcome>) {
    let config = Config::from_json_str(config_json).unwrap();
    let repository = Git2Repository::open(dir).unwrap();
    let io = NullIo::new();

    let mut runner = HookRunner::new(&config, &repository, &io).unwrap();
    let summary = runner.run(hook).unwrap();

    let report = &summary.reports()[0];
    let outcomes = report.log.entries().iter().map(|e| e.outcome).collect();
    (report.state, outcomes)
}

#[test]
fn echo_action_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let (state, outcomes) = run(
        dir.path(),
        r#"{"pre-commit": {"enabled": true, "actions": [{"action": "echo ok"}]}}"#,
        HookName::PreCommit,
    );

    assert_eq!(state, RunState::AllSucceeded);
    assert_eq!(outcomes, vec![Outcome::Succeeded]);
}

#[test]
fn fail_fast_skips_remaining_actions() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let (state, outcomes) = run(
        dir.path(),
        r#"{
            "config": {"fail-on-first-error": true},
            "pre-commit": {
                "actions": [
                    {"action": "false"},
                    {"action": "sh -c 'touch ran.txt'"}
                ]
            }
        }"#,
        HookName::PreCommit,
    );

    assert_eq!(state, RunState::SomeFailed);
    // The failing action is the only logged entry and the second command
    // never ran
    assert_eq!(outcomes, vec![Outcome::Failed]);
    assert!(!dir.path().join("ran.txt").exists());
}

#[test]
fn collect_all_runs_remaining_actions() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let (state, outcomes) = run(
        dir.path(),
        r#"{
            "config": {"fail-on-first-error": false},
            "pre-commit": {
                "actions": [
                    {"action": "false"},
                    {"action": "sh -c 'touch ran.txt'"}
                ]
            }
        }"#,
        HookName::PreCommit,
    );

    assert_eq!(state, RunState::SomeFailed);
    assert_eq!(outcomes, vec![Outcome::Failed, Outcome::Succeeded]);
    assert!(dir.path().join("ran.txt").exists());
}

#[test]
fn false_external_condition_skips_action() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let (state, outcomes) = run(
        dir.path(),
        r#"{"pre-commit": {
            "actions": [
                {
                    "action": "sh -c 'touch ran.txt'",
                    "conditions": [{"exec": "false"}]
                }
            ]
        }}"#,
        HookName::PreCommit,
    );

    assert_eq!(state, RunState::AllSucceeded);
    assert_eq!(outcomes, vec![Outcome::Skipped]);
    assert!(!dir.path().join("ran.txt").exists());
}

#[test]
fn and_condition_short_circuits_process_spawns() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let (_state, outcomes) = run(
        dir.path(),
        r#"{"pre-commit": {
            "actions": [
                {
                    "action": "echo ok",
                    "conditions": [
                        {
                            "exec": "and",
                            "args": [
                                {"exec": "false"},
                                {"exec": "sh -c 'touch cond-ran.txt'"}
                            ]
                        }
                    ]
                }
            ]
        }}"#,
        HookName::PreCommit,
    );

    assert_eq!(outcomes, vec![Outcome::Skipped]);
    // The second condition command was never spawned
    assert!(!dir.path().join("cond-ran.txt").exists());
}

#[test]
fn or_condition_short_circuits_process_spawns() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let (_state, outcomes) = run(
        dir.path(),
        r#"{"pre-commit": {
            "actions": [
                {
                    "action": "echo ok",
                    "conditions": [
                        {
                            "exec": "or",
                            "args": [
                                {"exec": "true"},
                                {"exec": "sh -c 'touch cond-ran.txt'"}
                            ]
                        }
                    ]
                }
            ]
        }}"#,
        HookName::PreCommit,
    );

    assert_eq!(outcomes, vec![Outcome::Succeeded]);
    assert!(!dir.path().join("cond-ran.txt").exists());
}

#[test]
fn staged_files_placeholder_reaches_the_command() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    // Stage a new rust file
    fs::write(dir.path().join("new.rs"), "fn main() {}\n").unwrap();
    let repo = git2::Repository::open(dir.path()).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("new.rs")).unwrap();
    index.write().unwrap();

    let (state, outcomes) = run(
        dir.path(),
        r#"{"pre-commit": {
            "actions": [
                {"action": "sh -c 'echo {$STAGED_FILES|of-type:rs} > staged.txt'"}
            ]
        }}"#,
        HookName::PreCommit,
    );

    assert_eq!(state, RunState::AllSucceeded);
    assert_eq!(outcomes, vec![Outcome::Succeeded]);
    let staged = fs::read_to_string(dir.path().join("staged.txt")).unwrap();
    assert_eq!(staged.trim(), "new.rs");
}
