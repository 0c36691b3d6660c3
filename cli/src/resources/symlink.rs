//! Symlink resource.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::helpers::fs::{ensure_parent_dir, remove_existing};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ProvisionError;

/// A symlink resource that can be checked and applied.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The master file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The alias path (where the symlink will be created).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        remove_existing(&self.target)?;
        ensure_parent_dir(&self.target)?;
        std::os::unix::fs::symlink(&self.source, &self.target).with_context(|| {
            format!(
                "create link: {} -> {}",
                self.target.display(),
                self.source.display()
            )
        })?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Err(ProvisionError::MissingFile(self.source.clone()).into());
        }

        let Ok(meta) = self.target.symlink_metadata() else {
            return Ok(ResourceState::Missing);
        };

        if meta.is_symlink() {
            if resolves_to(&self.target, &self.source) {
                return Ok(ResourceState::Correct);
            }
            let current = std::fs::read_link(&self.target)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return Ok(ResourceState::Incorrect {
                current: format!("points to {current}"),
            });
        }

        if meta.is_dir() {
            return Err(ProvisionError::invalid_state(
                self.target.display(),
                "alias cannot be an existing directory",
            )
            .into());
        }

        Ok(ResourceState::Incorrect {
            current: "target is a regular file".to_string(),
        })
    }
}

/// Whether `link`, after following all symlinks, is the same object as
/// `source`.
fn resolves_to(link: &Path, source: &Path) -> bool {
    match (dunce::canonicalize(link), dunce::canonicalize(source)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
