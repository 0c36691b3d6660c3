#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `apply` command.
//!
//! These tests exercise the full task list produced by [`tasks::all_tasks`],
//! the name-based filtering applied by the `--skip` and `--only` flags, and
//! the argument parsing of the binary.

mod common;

use std::collections::HashSet;

use automac_cli::cli::{Cli, Command};
use automac_cli::tasks;
use clap::Parser;

// ---------------------------------------------------------------------------
// Snapshot: full task list
// ---------------------------------------------------------------------------

/// Snapshot of all task names in their execution order.
#[test]
fn apply_task_names() {
    let all_tasks = tasks::all_tasks();
    let task_names: Vec<&str> = all_tasks.iter().map(|t| t.name()).collect();
    insta::assert_snapshot!("apply_task_names", task_names.join("\n"));
}

// ---------------------------------------------------------------------------
// Structural invariants
// ---------------------------------------------------------------------------

#[test]
fn task_names_are_unique() {
    let all_tasks = tasks::all_tasks();
    let mut seen: HashSet<&str> = HashSet::new();
    for task in &all_tasks {
        assert!(seen.insert(task.name()), "duplicate task name: {}", task.name());
    }
}

#[test]
fn homebrew_runs_before_anything_that_needs_it() {
    let names: Vec<&str> = tasks::all_tasks().iter().map(|t| t.name()).collect();
    let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
    assert!(position("Install Homebrew") < position("Install packages"));
    assert!(position("Install packages") < position("Configure login shell"));
    assert!(position("Install packages") < position("Associate file types"));
    assert!(position("Remove quarantine") < position("Launch apps"));
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

fn selected(only: &[&str], skip: &[&str]) -> Vec<&'static str> {
    let all_tasks = tasks::all_tasks();
    let only: Vec<String> = only.iter().map(ToString::to_string).collect();
    let skip: Vec<String> = skip.iter().map(ToString::to_string).collect();
    tasks::select(&all_tasks, &only, &skip)
        .iter()
        .map(|t| t.name())
        .collect()
}

#[test]
fn no_filters_select_everything() {
    assert_eq!(selected(&[], &[]).len(), tasks::all_tasks().len());
}

#[test]
fn only_keeps_matching_tasks_in_order() {
    assert_eq!(
        selected(&["timezone", "install"], &[]),
        [
            "Install Homebrew",
            "Install packages",
            "Install symlinks",
            "Configure timezone"
        ]
    );
}

#[test]
fn only_wins_over_skip() {
    assert_eq!(selected(&["preferences"], &["preferences"]), ["Apply preferences"]);
}

#[test]
fn skip_is_case_insensitive() {
    let names = selected(&[], &["NOTIFICATIONS", "Quarantine"]);
    assert_eq!(names.len(), tasks::all_tasks().len() - 2);
    assert!(!names.contains(&"Configure notifications"));
    assert!(!names.contains(&"Remove quarantine"));
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

#[test]
fn apply_flags_split_on_commas() {
    let cli = Cli::parse_from([
        "automac",
        "-v",
        "apply",
        "--config",
        "mac.toml",
        "--only",
        "packages,symlinks",
    ]);
    assert!(cli.verbose);
    assert!(matches!(
        &cli.command,
        Command::Apply(opts) if opts.only == ["packages", "symlinks"] && opts.skip.is_empty()
    ));
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["automac", "install"]).is_err());
}
