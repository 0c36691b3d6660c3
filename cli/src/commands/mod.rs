//! Top-level subcommand orchestration.
pub mod apply;
pub mod check_config;
pub mod version;

use std::path::Path;

use anyhow::Result;

use crate::config::Manifest;
use crate::logging::Log;

/// Load a manifest and run semantic validation, logging every warning.
///
/// # Errors
///
/// Returns an error if the manifest is missing, unparsable or contains an
/// entry that can never apply.
pub fn load_manifest(path: &Path, home: &Path, log: &dyn Log) -> Result<Manifest> {
    log.stage("Loading manifest");
    let manifest = Manifest::load(path)?;
    log.info(&format!("manifest: {}", path.display()));
    log.debug(&format!("{} directories", manifest.directories.len()));
    log.debug(&format!("{} symlinks", manifest.symlinks.len()));
    log.debug(&format!("{} preferences", manifest.preferences.len()));
    log.debug(&format!("{} notification toggles", manifest.notifications.len()));
    log.debug(&format!("{} file associations", manifest.file_associations.len()));

    let warnings = manifest.validate(home)?;
    if !warnings.is_empty() {
        log.warn(&format!(
            "found {} configuration warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            log.warn(&format!(
                "  {} [{}]: {}",
                warning.source, warning.item, warning.message
            ));
        }
    }
    Ok(manifest)
}
