//! Directory resources: existence (`mkdir -p`) and Finder visibility.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ProvisionError;
use crate::exec::Executor;

/// BSD file flag that hides a path from Finder.
pub const HIDDEN_FLAG: &str = "hidden";

/// A directory that must exist.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Directory path.
    pub path: PathBuf,
}

impl DirectoryResource {
    /// Create a new directory resource.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Applicable for DirectoryResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("create directory: {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DirectoryResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_dir() {
            Ok(ResourceState::Correct)
        } else if self.path.exists() {
            Err(ProvisionError::invalid_state(self.path.display(), "exists and is not a directory").into())
        } else {
            Ok(ResourceState::Missing)
        }
    }
}

/// A path that Finder must show: its `hidden` flag is cleared.
///
/// Flags are read with `stat -f %Sf` (the link itself, not its target) and
/// cleared with a privileged `chflags nohidden`.
#[derive(Debug)]
pub struct VisibleResource<'a> {
    path: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> VisibleResource<'a> {
    /// Create a visibility resource for `path`.
    #[must_use]
    pub const fn new(path: PathBuf, executor: &'a dyn Executor) -> Self {
        Self { path, executor }
    }
}

impl Applicable for VisibleResource<'_> {
    fn description(&self) -> String {
        format!("unhide {}", self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let path = self.path.to_string_lossy();
        self.executor.sudo("chflags", &["nohidden", &path], true)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for VisibleResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if self.path.symlink_metadata().is_err() {
            return Err(ProvisionError::MissingFile(self.path.clone()).into());
        }
        let path = self.path.to_string_lossy();
        let flags = self.executor.probe("stat", &["-f", "%Sf", &path])?;
        if flags.stdout.split(',').any(|f| f.trim() == HIDDEN_FLAG) {
            Ok(ResourceState::Incorrect {
                current: flags.stdout,
            })
        } else {
            Ok(ResourceState::Correct)
        }
    }
}
