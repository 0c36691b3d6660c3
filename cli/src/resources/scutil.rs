//! `scutil` named system settings (machine identity).
use anyhow::Result;

use super::defaults::KeyValueStore;
use super::value::Scalar;
use super::{Applicable, Resource, ResourceChange, ResourceState, converge};
use crate::error::ProvisionError;
use crate::exec::Executor;

const SCUTIL: &str = "scutil";

/// Machine-identity keys managed through `scutil`.
pub const IDENTITY_KEYS: [&str; 3] = ["ComputerName", "HostName", "LocalHostName"];

/// A single named setting such as `ComputerName`.
#[derive(Debug)]
pub struct NamedSetting<'a> {
    key: String,
    value: String,
    executor: &'a dyn Executor,
}

impl<'a> NamedSetting<'a> {
    /// Create a named setting resource.
    #[must_use]
    pub fn new(key: &str, value: &str, executor: &'a dyn Executor) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            executor,
        }
    }
}

impl Applicable for NamedSetting<'_> {
    fn description(&self) -> String {
        format!("{} = {}", self.key, self.value)
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor
            .sudo(SCUTIL, &["--set", &self.key, &self.value], true)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for NamedSetting<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        // scutil exits non-zero when the setting has no value
        let result = self.executor.probe_unchecked(SCUTIL, &["--get", &self.key])?;
        if !result.success {
            return Ok(ResourceState::Missing);
        }
        if result.stdout == self.value {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: result.stdout,
            })
        }
    }
}

/// SMB server preferences holding the NetBIOS name.
pub const SMB_SERVER_DOMAIN: &str = "/Library/Preferences/SystemConfiguration/com.apple.smb.server";

/// Set every machine-identity name plus the SMB NetBIOS name to `name`.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidConfig`] for an empty name, or the first
/// failing write.
pub fn set_all_names(executor: &dyn Executor, name: &str) -> Result<Vec<(String, ResourceChange)>> {
    if name.trim().is_empty() {
        return Err(ProvisionError::InvalidConfig("machine name is empty".to_string()).into());
    }
    let mut changes = Vec::with_capacity(IDENTITY_KEYS.len() + 1);
    for key in IDENTITY_KEYS {
        let setting = NamedSetting::new(key, name, executor);
        changes.push((setting.description(), converge(&setting)?));
    }
    let netbios = KeyValueStore::new(executor).write(
        SMB_SERVER_DOMAIN,
        "NetBIOSName",
        Scalar::String(name.to_string()),
        false,
        true,
    )?;
    changes.push((format!("NetBIOSName = {name}"), netbios));
    Ok(changes)
}
