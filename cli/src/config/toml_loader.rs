//! TOML configuration file parsing.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ProvisionError;

/// Load and deserialize a TOML file.
///
/// # Errors
///
/// Returns [`ProvisionError::MissingFile`] if the file does not exist, or an
/// error if it cannot be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ProvisionError::MissingFile(path.to_path_buf()).into());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}
