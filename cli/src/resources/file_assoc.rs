//! File-type handler associations via `duti`.
use std::fmt;

use anyhow::Result;
use serde::Deserialize;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// Default `duti` location (installed by Homebrew).
pub const DUTI: &str = "/opt/homebrew/bin/duti";

/// Launch Services role granted to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No role.
    None,
    /// Open for viewing.
    Viewer,
    /// Open for editing.
    Editor,
    /// Every role.
    All,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::All => "all",
        })
    }
}

/// Normalize a manifest extension: trim, drop one leading dot.
///
/// Returns `None` for empty or multi-part extensions such as `tar.gz`.
#[must_use]
pub fn normalize_extension(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let ext = trimmed.strip_prefix('.').unwrap_or(trimmed);
    (!ext.is_empty() && !ext.contains('.')).then_some(ext)
}

/// Current handler bundle id for `ext`, or empty when unknown.
///
/// `duti -x` prints the app name, its path and its bundle id on three lines.
///
/// # Errors
///
/// Returns an error only if `duti` cannot be spawned.
pub fn current_handler(executor: &dyn Executor, duti: &str, ext: &str) -> Result<String> {
    let result = executor.probe_unchecked(duti, &["-x", ext])?;
    if !result.success {
        return Ok(String::new());
    }
    Ok(result
        .stdout
        .lines()
        .nth(2)
        .map(|l| l.trim().to_string())
        .unwrap_or_default())
}

/// Association of one extension with an app bundle.
#[derive(Debug)]
pub struct FileAssociation<'a> {
    ext: String,
    bundle_id: String,
    role: Role,
    duti: String,
    executor: &'a dyn Executor,
}

impl<'a> FileAssociation<'a> {
    /// Create an association; `ext` must already be normalized.
    #[must_use]
    pub fn new(ext: &str, bundle_id: &str, role: Role, executor: &'a dyn Executor) -> Self {
        Self {
            ext: ext.to_string(),
            bundle_id: bundle_id.to_string(),
            role,
            duti: DUTI.to_string(),
            executor,
        }
    }

    /// Override the `duti` executable.
    #[must_use]
    pub fn with_duti(mut self, duti: &str) -> Self {
        self.duti = duti.to_string();
        self
    }
}

impl Applicable for FileAssociation<'_> {
    fn description(&self) -> String {
        format!(".{} -> {} ({})", self.ext, self.bundle_id, self.role)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let before = current_handler(self.executor, &self.duti, &self.ext)?;
        let dotted = format!(".{}", self.ext);
        let role = self.role.to_string();
        self.executor
            .run(&self.duti, &["-s", &self.bundle_id, &dotted, &role])?;
        let after = current_handler(self.executor, &self.duti, &self.ext)?;
        if after == before {
            return Ok(ResourceChange::Skipped {
                reason: format!(
                    "extension reassignment had no effect: `{}` still opens with `{before}` instead of `{}` (role `{role}`), try `editor` or `all`",
                    self.ext, self.bundle_id
                ),
            });
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for FileAssociation<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let current = current_handler(self.executor, &self.duti, &self.ext)?;
        if current == self.bundle_id {
            Ok(ResourceState::Correct)
        } else if current.is_empty() {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Incorrect { current })
        }
    }
}
