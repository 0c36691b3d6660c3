//! Per-app notification permissions in the `ncprefs` store.
//!
//! The store holds an `apps` array of records keyed by `bundle-id`. Only bit
//! 25 of each record's `flags` is managed; every other bit is preserved. An
//! existing record is patched in place with `PlistBuddy`, a missing one is
//! appended with `defaults write ... -array-add`. Either mutation leaves a
//! pending reload that [`NotificationRegistry::reload_if_pending`] consumes.
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use super::apps;
use super::value;
use super::{Applicable, Resource, ResourceChange, ResourceState, converge};
use crate::error::ProvisionError;
use crate::exec::Executor;

/// The "notifications enabled" bit of a record's `flags`.
pub const NOTIFICATIONS_ENABLED: i64 = 1 << 25;

/// Flags of a freshly registered app on macOS 13: notifications off,
/// badges, sounds and banners on.
pub const FLAGS_BASE: i64 = 8_396_814;

/// Processes that cache the notification configuration.
pub const RELOAD_PROCESSES: [&str; 3] = ["System Settings", "NotificationCenter", "usernoted"];

const PLIST_BUDDY: &str = "/usr/libexec/PlistBuddy";

/// Location of the store relative to the user's home directory.
#[must_use]
pub fn store_path(home: &Path) -> PathBuf {
    home.join("Library/Preferences/com.apple.ncprefs.plist")
}

/// Set or clear `bit` in `flags`, leaving all other bits untouched.
#[must_use]
pub const fn set_bit(flags: i64, bit: i64, on: bool) -> i64 {
    if on { flags | bit } else { flags & !bit }
}

/// Mutation required to reach the desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationPlan {
    /// The record already carries the desired bit.
    Unchanged,
    /// Rewrite `apps[index].flags`.
    Patch {
        /// Position of the record in the `apps` array.
        index: usize,
        /// New flags value.
        flags: i64,
    },
    /// Append a new record with these flags.
    Append {
        /// Flags of the new record.
        flags: i64,
    },
    /// Nothing can be done; the reason is reported as a warning.
    Skip(String),
}

/// Decide how to bring `bundle_id` to the desired state in `document`.
#[must_use]
pub fn plan(
    document: &plist::Value,
    bundle_id: &str,
    app_path: Option<&str>,
    enabled: bool,
) -> NotificationPlan {
    let records = document
        .as_dictionary()
        .and_then(|d| d.get("apps"))
        .and_then(plist::Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let found = records.iter().enumerate().find(|(_, record)| {
        record
            .as_dictionary()
            .and_then(|d| d.get("bundle-id"))
            .and_then(plist::Value::as_string)
            == Some(bundle_id)
    });

    match found {
        Some((index, record)) => {
            let flags = record
                .as_dictionary()
                .and_then(|d| d.get("flags"))
                .and_then(plist::Value::as_signed_integer);
            match flags {
                None => NotificationPlan::Skip(format!("no flags recorded for {bundle_id}")),
                Some(old) => {
                    let new = set_bit(old, NOTIFICATIONS_ENABLED, enabled);
                    if new == old {
                        NotificationPlan::Unchanged
                    } else {
                        NotificationPlan::Patch { index, flags: new }
                    }
                }
            }
        }
        None if app_path.is_some() => NotificationPlan::Append {
            flags: set_bit(FLAGS_BASE, NOTIFICATIONS_ENABLED, enabled),
        },
        None => NotificationPlan::Skip(format!(
            "cannot register {bundle_id} without an app path"
        )),
    }
}

/// Property-list record for a newly registered app.
#[must_use]
pub fn new_record(bundle_id: &str, app_path: &str, flags: i64) -> plist::Value {
    let mut record = plist::Dictionary::new();
    record.insert("auth".to_string(), plist::Value::Integer(7_i64.into()));
    record.insert(
        "bundle-id".to_string(),
        plist::Value::String(bundle_id.to_string()),
    );
    record.insert(
        "content_visibility".to_string(),
        plist::Value::Integer(0_i64.into()),
    );
    record.insert("flags".to_string(), plist::Value::Integer(flags.into()));
    record.insert("grouping".to_string(), plist::Value::Integer(0_i64.into()));
    record.insert(
        "path".to_string(),
        plist::Value::String(app_path.to_string()),
    );
    record.insert("src".to_string(), plist::Value::Array(Vec::new()));
    plist::Value::Dictionary(record)
}

/// Desired notification state of one bundle id.
#[derive(Debug)]
pub struct NotificationSetting<'a> {
    store: PathBuf,
    bundle_id: String,
    app_path: Option<String>,
    enabled: bool,
    executor: &'a dyn Executor,
    pending_reload: &'a AtomicBool,
    planned: OnceCell<NotificationPlan>,
}

impl<'a> NotificationSetting<'a> {
    /// Create a notification setting against the store at `store`.
    #[must_use]
    pub fn new(
        store: PathBuf,
        bundle_id: &str,
        app_path: Option<&str>,
        enabled: bool,
        executor: &'a dyn Executor,
        pending_reload: &'a AtomicBool,
    ) -> Self {
        Self {
            store,
            bundle_id: bundle_id.to_string(),
            app_path: app_path.map(String::from),
            enabled,
            executor,
            pending_reload,
            planned: OnceCell::new(),
        }
    }

    fn compute_plan(&self) -> Result<NotificationPlan> {
        if !self.store.exists() {
            return Err(ProvisionError::MissingFile(self.store.clone()).into());
        }
        let store = self.store.to_string_lossy();
        let exported = self.executor.probe("defaults", &["export", &store, "-"])?;
        let document = value::parse_document(&exported.stdout)
            .with_context(|| format!("reading {store}"))?;
        Ok(plan(
            &document,
            &self.bundle_id,
            self.app_path.as_deref(),
            self.enabled,
        ))
    }

    fn current_plan(&self) -> Result<&NotificationPlan> {
        if let Some(p) = self.planned.get() {
            return Ok(p);
        }
        let p = self.compute_plan()?;
        Ok(self.planned.get_or_init(|| p))
    }
}

impl Applicable for NotificationSetting<'_> {
    fn description(&self) -> String {
        let state = if self.enabled { "on" } else { "off" };
        format!("notifications {} for {}", state, self.bundle_id)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let store = self.store.to_string_lossy();
        match self.current_plan()? {
            NotificationPlan::Unchanged => return Ok(ResourceChange::AlreadyCorrect),
            NotificationPlan::Skip(reason) => {
                return Ok(ResourceChange::Skipped {
                    reason: reason.clone(),
                });
            }
            NotificationPlan::Patch { index, flags } => {
                let edit = format!("Set :apps:{index}:flags {flags}");
                self.executor.run(PLIST_BUDDY, &["-c", &edit, &store])?;
            }
            NotificationPlan::Append { flags } => {
                let path = self.app_path.as_deref().unwrap_or_default();
                let record = value::to_fragment(&new_record(&self.bundle_id, path, *flags))?;
                self.executor
                    .run("defaults", &["write", &store, "apps", "-array-add", &record])?;
            }
        }
        self.pending_reload.store(true, Ordering::SeqCst);
        Ok(ResourceChange::Applied)
    }
}

impl Resource for NotificationSetting<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(match self.current_plan()? {
            NotificationPlan::Unchanged => ResourceState::Correct,
            NotificationPlan::Skip(reason) => ResourceState::Invalid {
                reason: reason.clone(),
            },
            NotificationPlan::Patch { flags, .. } => ResourceState::Incorrect {
                current: format!("flags -> {flags}"),
            },
            NotificationPlan::Append { .. } => ResourceState::Missing,
        })
    }
}

/// Facade over the notification store.
#[derive(Debug, Clone)]
pub struct NotificationRegistry<'a> {
    executor: &'a dyn Executor,
    store: PathBuf,
    applications_dir: PathBuf,
    pending_reload: Arc<AtomicBool>,
}

impl<'a> NotificationRegistry<'a> {
    /// Create a registry for the store at `store`.
    #[must_use]
    pub const fn new(
        executor: &'a dyn Executor,
        store: PathBuf,
        applications_dir: PathBuf,
        pending_reload: Arc<AtomicBool>,
    ) -> Self {
        Self {
            executor,
            store,
            applications_dir,
            pending_reload,
        }
    }

    /// Set notifications for `bundle_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is missing or a command fails.
    pub fn set_enabled(
        &self,
        bundle_id: &str,
        app_path: Option<&str>,
        enabled: bool,
    ) -> Result<ResourceChange> {
        converge(&NotificationSetting::new(
            self.store.clone(),
            bundle_id,
            app_path,
            enabled,
            self.executor,
            &self.pending_reload,
        ))
    }

    /// Set notifications for an app located by name or path.
    ///
    /// The app path is resolved through symlinks, since the store references
    /// versioned real paths. A missing app is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle id cannot be determined or the update
    /// fails.
    pub fn set_app(&self, app_name: &str, enabled: bool) -> Result<ResourceChange> {
        let Some(found) = apps::find_app_path(&self.applications_dir, app_name) else {
            let verb = if enabled { "enabled" } else { "disabled" };
            return Ok(ResourceChange::Skipped {
                reason: format!("Missing app `{app_name}` - it won't be {verb}"),
            });
        };
        let real = dunce::canonicalize(&found)
            .with_context(|| format!("resolving {}", found.display()))?;
        let real = real.to_string_lossy();
        let bundle = apps::bundle_id(self.executor, &real)?;
        if bundle.is_empty() {
            return Ok(ResourceChange::Skipped {
                reason: format!("no bundle id for {real}"),
            });
        }
        self.set_enabled(&bundle, Some(&real), enabled)
    }

    /// Enable notifications for an app.
    ///
    /// # Errors
    ///
    /// See [`set_app`](Self::set_app).
    pub fn enable_app(&self, app_name: &str) -> Result<ResourceChange> {
        self.set_app(app_name, true)
    }

    /// Disable notifications for an app.
    ///
    /// # Errors
    ///
    /// See [`set_app`](Self::set_app).
    pub fn disable_app(&self, app_name: &str) -> Result<ResourceChange> {
        self.set_app(app_name, false)
    }

    /// Whether a store mutation is awaiting a reload.
    #[must_use]
    pub fn reload_pending(&self) -> bool {
        self.pending_reload.load(Ordering::SeqCst)
    }

    /// Restart the notification services once if the store was modified.
    ///
    /// # Errors
    ///
    /// Returns an error only if `killall` cannot be spawned.
    pub fn reload_if_pending(&self) -> Result<bool> {
        if !self.pending_reload.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        for process in RELOAD_PROCESSES {
            self.executor.run_unchecked("killall", &[process])?;
        }
        Ok(true)
    }
}
