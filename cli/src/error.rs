//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return [`ProvisionError`] variants (lifted into
//! [`anyhow::Error`] with `?`) for every condition that must halt the run.
//! Recoverable anomalies are *not* errors: resources report them as
//! [`ResourceChange::Skipped`](crate::resources::ResourceChange::Skipped)
//! and the run continues.
//!
//! The command layer turns the first error that reaches it into the
//! `ABORT: <message>` completion state.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions that abort a provisioning run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A checked external command exited non-zero (or was killed by a signal).
    #[error("Shell command failed: {command} - exit code {exit_code}{}", stderr_suffix(.stderr))]
    CommandFailed {
        /// Shell-quoted command line, as printed in the audit log.
        command: String,
        /// Exit code of the process; `-1` when terminated by a signal.
        exit_code: i32,
        /// Trimmed stderr of the process; empty for terminal-attached runs.
        stderr: String,
    },

    /// A file that must exist before this step runs is absent.
    #[error("Missing file {}", .0.display())]
    MissingFile(PathBuf),

    /// A required executable was not found at any of its known locations.
    #[error("{0} not found")]
    ToolNotFound(String),

    /// A resource is in a state the engine refuses to overwrite.
    #[error("invalid state for '{resource}': {reason}")]
    InvalidState {
        /// Name or path of the resource.
        resource: String,
        /// Why the state is unacceptable.
        reason: String,
    },

    /// The provisioning manifest is semantically invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl ProvisionError {
    /// Build a [`ProvisionError::InvalidState`] from anything displayable.
    #[must_use]
    pub fn invalid_state(resource: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            resource: resource.to_string(),
            reason: reason.into(),
        }
    }
}
