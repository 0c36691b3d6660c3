//! Manifest sections: the data describing one provisioning run.
use serde::Deserialize;

use crate::resources::file_assoc::Role;
use crate::resources::value::PrefValue;

/// Homebrew bootstrap and package lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HomebrewConfig {
    /// Run the official install script when brew is absent.
    pub bootstrap: bool,
    /// Opt out of Homebrew analytics.
    pub analytics_off: bool,
    /// Formula names.
    pub formulae: Vec<String>,
    /// Cask names.
    pub casks: Vec<String>,
    /// Files listing formulae, one per line.
    pub formula_lists: Vec<String>,
    /// Files listing casks, one per line.
    pub cask_lists: Vec<String>,
}

impl HomebrewConfig {
    /// Whether any package would be installed.
    #[must_use]
    pub fn has_packages(&self) -> bool {
        !(self.formulae.is_empty()
            && self.casks.is_empty()
            && self.formula_lists.is_empty()
            && self.cask_lists.is_empty())
    }
}

/// A symlink: `target` is the alias pointing at `source`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymlinkEntry {
    /// Master file or directory (tilde-expanded).
    pub source: String,
    /// Alias path (tilde-expanded).
    pub target: String,
}

/// One `defaults` write or delete.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferenceEntry {
    /// Preference domain, e.g. `com.apple.dock`.
    pub domain: String,
    /// Key within the domain.
    pub key: String,
    /// Value to write; absent for deletions.
    pub value: Option<PrefValue>,
    /// Delete the key instead of writing it.
    #[serde(default)]
    pub delete: bool,
    /// Target the per-host preferences.
    #[serde(default)]
    pub current_host: bool,
    /// Write with elevated privileges.
    #[serde(default)]
    pub sudo: bool,
}

/// Notification toggle for one app, by name or by bundle id.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationEntry {
    /// App name or bundle path, resolved under the applications directory.
    pub app: Option<String>,
    /// Bundle identifier, used as-is.
    pub bundle_id: Option<String>,
    /// Bundle path recorded for new store entries.
    pub path: Option<String>,
    /// Desired state.
    pub enabled: bool,
}

/// File-type association for one app.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationEntry {
    /// App name or bundle path.
    pub app: Option<String>,
    /// Bundle identifier, used as-is.
    pub bundle_id: Option<String>,
    /// Extensions, with or without a leading dot.
    pub extensions: Vec<String>,
    /// Role granted to the handler.
    #[serde(default = "default_role")]
    pub role: Role,
}

const fn default_role() -> Role {
    Role::All
}

/// The full description of a provisioning run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Manifest {
    /// Directories searched for relative list files.
    pub lookup_dirs: Vec<String>,
    /// Applications directory override (default `/Applications`).
    pub applications_dir: Option<String>,
    /// Machine name for `ComputerName`, `HostName`, `LocalHostName` and SMB.
    pub computer_name: Option<String>,
    /// IANA zone name, e.g. `Europe/Berlin`.
    pub timezone: Option<String>,
    /// Absolute path of the desired login shell.
    pub login_shell: Option<String>,
    /// Directories to create.
    pub directories: Vec<String>,
    /// Apps to clear the quarantine attribute from.
    pub quarantine: Vec<String>,
    /// Paths whose hidden flag is cleared (e.g. `~/Library`).
    pub unhide: Vec<String>,
    /// Stop asking for a password after sleep or screen saver.
    pub screen_lock_off: bool,
    /// Apps started when not already running (login helpers, menu bar apps).
    pub launch_apps: Vec<String>,
    /// Steps printed after a successful run.
    pub manual_steps: Vec<String>,
    /// Homebrew section.
    pub homebrew: HomebrewConfig,
    /// Symlinks to install.
    pub symlinks: Vec<SymlinkEntry>,
    /// Preference writes and deletes.
    pub preferences: Vec<PreferenceEntry>,
    /// Notification toggles.
    pub notifications: Vec<NotificationEntry>,
    /// File-type associations.
    pub file_associations: Vec<AssociationEntry>,
}
