//! Working-tree round-trip through the preservation plugin
//!
//! Verifies the core guarantee: a pre-commit run only exposes staged
//! content to its actions, and unstaged changes plus intent-to-add
//! markers survive the run byte-identical.

#![allow(clippy::unwrap_used, clippy::panic)]

use grapnel_config::Config;
use grapnel_core::{HookName, NullIo};
use grapnel_engine::repository::{Git2Repository, Repository};
use grapnel_engine::runner::HookRunner;
use std::fs;
use std::path::{Path, PathBuf};

fn init_repo(dir: &Path) {
    let repo = git2::Repository::init(dir).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }

    fs::write(dir.join("tracked.txt"), "one\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("tracked.txt")).unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
        .unwrap();
}

const CONFIG: &str = r#"{
    "config": {
        "plugins": [{"plugin": "preserve-working-tree"}]
    },
    "pre-commit": {
        "actions": [
            {"action": "sh -c 'cat tracked.txt > seen.txt'"}
        ]
    }
}"#;

#[test]
fn unstaged_changes_are_hidden_from_actions_and_restored() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    // Unstaged edit on top of the committed content
    fs::write(dir.path().join("tracked.txt"), "one\ntwo\n").unwrap();

    let config = Config::from_json_str(CONFIG).unwrap();
    let repository = Git2Repository::open(dir.path()).unwrap();
    let io = NullIo::new();

    let mut runner = HookRunner::new(&config, &repository, &io).unwrap();
    let summary = runner.run(HookName::PreCommit).unwrap();
    assert!(summary.succeeded());

    // The action saw the index state, not the unstaged edit
    let seen = fs::read_to_string(dir.path().join("seen.txt")).unwrap();
    assert_eq!(seen, "one\n");

    // The unstaged edit is back, byte-identical
    let restored = fs::read_to_string(dir.path().join("tracked.txt")).unwrap();
    assert_eq!(restored, "one\ntwo\n");
}

#[test]
fn intent_to_add_marker_survives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let repository = Git2Repository::open(dir.path()).unwrap();

    // New file marked intent-to-add
    fs::write(dir.path().join("fresh.txt"), "new content\n").unwrap();
    repository
        .mark_intent_to_add(&[PathBuf::from("fresh.txt")])
        .unwrap();
    assert_eq!(
        repository.intent_to_add_paths().unwrap(),
        vec![PathBuf::from("fresh.txt")]
    );

    let config = Config::from_json_str(CONFIG).unwrap();
    let io = NullIo::new();
    let mut runner = HookRunner::new(&config, &repository, &io).unwrap();
    let summary = runner.run(HookName::PreCommit).unwrap();
    assert!(summary.succeeded());

    // File content untouched, intent-to-add marker re-applied
    assert_eq!(
        fs::read_to_string(dir.path().join("fresh.txt")).unwrap(),
        "new content\n"
    );
    assert_eq!(
        repository.intent_to_add_paths().unwrap(),
        vec![PathBuf::from("fresh.txt")]
    );
}

#[test]
fn clean_tree_runs_without_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let config = Config::from_json_str(CONFIG).unwrap();
    let repository = Git2Repository::open(dir.path()).unwrap();
    let io = NullIo::new();

    let mut runner = HookRunner::new(&config, &repository, &io).unwrap();
    let summary = runner.run(HookName::PreCommit).unwrap();
    assert!(summary.succeeded());

    assert_eq!(
        fs::read_to_string(dir.path().join("seen.txt")).unwrap(),
        "one\n"
    );
}
