//! Declarative macOS provisioning engine.
//!
//! Brings a Mac to the state described by a TOML manifest: Homebrew
//! packages, symlinks, machine names, timezone, login shell, `defaults`
//! preferences, notification permissions, quarantine flags and file-type
//! handlers. Every change goes through a check-then-apply step, so a second
//! run against an unchanged machine issues no mutating commands.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: parse and validate the TOML manifest
//! - **[`resources`]**: idempotent `check + apply` primitives over system commands
//! - **[`tasks`]**: named, ordered units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration (`apply`, `check-config`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod tasks;
