//! Application bundle lookup, quarantine removal and launching.
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// Extended attribute set by Gatekeeper on downloaded apps.
pub const QUARANTINE_ATTR: &str = "com.apple.quarantine";

/// Locate an application bundle.
///
/// An absolute `name` is used as-is; otherwise `<applications_dir>/<name>`
/// with `.app` appended when missing. Returns `None` if the path does not
/// exist.
#[must_use]
pub fn find_app_path(applications_dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    let path = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else if name.ends_with(".app") {
        applications_dir.join(name)
    } else {
        applications_dir.join(format!("{name}.app"))
    };
    path.exists().then_some(path)
}

/// AppleScript reading the bundle id of the app named by its first argument.
const BUNDLE_ID_SCRIPT: [&str; 6] = [
    "-e",
    "on run argv",
    "-e",
    "id of app (item 1 of argv)",
    "-e",
    "end run",
];

/// Bundle identifier of the app at `path` (or app name), via AppleScript.
///
/// The app is passed as a script argument, never spliced into the source.
///
/// # Errors
///
/// Returns an error if `osascript` fails, e.g. for an unknown app.
pub fn bundle_id(executor: &dyn Executor, app: &str) -> Result<String> {
    let mut args = BUNDLE_ID_SCRIPT.to_vec();
    args.push(app);
    Ok(executor.probe("osascript", &args)?.stdout)
}

/// Removal of the quarantine attribute from an app bundle.
#[derive(Debug)]
pub struct QuarantineResource<'a> {
    path: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> QuarantineResource<'a> {
    /// Create a quarantine resource for the bundle at `path`.
    #[must_use]
    pub const fn new(path: PathBuf, executor: &'a dyn Executor) -> Self {
        Self { path, executor }
    }
}

impl Applicable for QuarantineResource<'_> {
    fn description(&self) -> String {
        format!("unquarantine {}", self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let path = self.path.to_string_lossy();
        self.executor
            .run("xattr", &["-dr", QUARANTINE_ATTR, &path])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for QuarantineResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let path = self.path.to_string_lossy();
        let attrs = self.executor.probe("xattr", &[&path])?;
        if attrs.stdout.lines().any(|l| l.trim() == QUARANTINE_ATTR) {
            Ok(ResourceState::Incorrect {
                current: QUARANTINE_ATTR.to_string(),
            })
        } else {
            Ok(ResourceState::Correct)
        }
    }
}

/// Process name of an app: the bundle's file name without `.app`.
#[must_use]
pub fn process_name(app: &Path) -> String {
    let name = app
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".app").map_or_else(|| name.clone(), str::to_string)
}

/// An app that must be running; started with `open` when no process with
/// its exact name exists.
#[derive(Debug)]
pub struct RunningAppResource<'a> {
    path: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> RunningAppResource<'a> {
    /// Create a resource for the bundle at `path`.
    #[must_use]
    pub const fn new(path: PathBuf, executor: &'a dyn Executor) -> Self {
        Self { path, executor }
    }
}

impl Applicable for RunningAppResource<'_> {
    fn description(&self) -> String {
        format!("launch {}", process_name(&self.path))
    }

    fn apply(&self) -> Result<ResourceChange> {
        let path = self.path.to_string_lossy();
        self.executor.run("open", &[&path])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for RunningAppResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        // pgrep exits 1 when nothing matches
        let name = process_name(&self.path);
        let found = self.executor.probe_unchecked("pgrep", &["-x", &name])?;
        Ok(if found.success {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
