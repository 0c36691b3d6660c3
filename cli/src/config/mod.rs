//! Manifest loading, path resolution and validation.
pub mod manifest;
pub mod toml_loader;
pub mod validation;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

pub use manifest::Manifest;
pub use validation::ValidationWarning;

use crate::error::ProvisionError;
use crate::resources::helpers::fs::expand_tilde;

impl Manifest {
    /// Load a manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MissingFile`] if the file does not exist, or
    /// an error if it cannot be parsed (unknown keys included).
    pub fn load(path: &Path) -> Result<Self> {
        toml_loader::load_config(path).with_context(|| format!("loading {}", path.display()))
    }

    /// Validate the manifest before anything runs.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidConfig`] for entries that can never
    /// apply, e.g. an empty computer name.
    pub fn validate(&self, home: &Path) -> Result<Vec<ValidationWarning>> {
        validation::check_fatal(self)?;
        Ok(validation::validate_all(self, home))
    }

    /// Resolve a list file: absolute or tilde paths as-is, otherwise the
    /// first lookup directory that contains it.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MissingFile`] if no candidate exists.
    pub fn resolve_list_file(&self, name: &str, home: &Path) -> Result<PathBuf> {
        let direct = expand_tilde(name, home);
        if direct.is_absolute() {
            return if direct.exists() {
                Ok(direct)
            } else {
                Err(ProvisionError::MissingFile(direct).into())
            };
        }
        self.lookup_dirs
            .iter()
            .map(|dir| expand_tilde(dir, home).join(name))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| ProvisionError::MissingFile(PathBuf::from(name)).into())
    }
}

/// Shared helpers for config unit tests.
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub mod test_helpers {
    use std::path::PathBuf;

    /// Write `content` to `manifest.toml` in a fresh temp directory.
    #[must_use]
    pub fn write_temp_toml(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}
