//! Homebrew package resources.
//!
//! The installed-package catalog is queried once and cached in a
//! [`PackageCatalog`] that every handle of a run shares; casks additionally count as installed when an application
//! bundle mentioned by `brew info` already exists on disk.
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context as _, Result};
use serde::Deserialize;

use super::{Applicable, Resource, ResourceChange, ResourceState, converge};
use crate::error::ProvisionError;
use crate::exec::Executor;

/// Known Homebrew install locations, checked in order.
pub const BREW_CANDIDATES: [&str; 2] = ["/opt/homebrew/bin/brew", "/usr/local/bin/brew"];

/// Default directory holding macOS application bundles.
pub const APPLICATIONS_DIR: &str = "/Applications";

/// Official Homebrew bootstrap pipeline.
pub const BREW_INSTALL_SCRIPT: &str = r#"/bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#;

/// Kind of Homebrew package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Command-line formula.
    Formula,
    /// GUI application cask.
    Cask,
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Formula => write!(f, "formula"),
            Self::Cask => write!(f, "cask"),
        }
    }
}

/// Keep package names from a list file: drop blank lines and any line
/// containing a `#`.
#[must_use]
pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains('#'))
        .map(String::from)
        .collect()
}

/// Extract `.app` bundle names mentioned in `brew info` output, one per
/// matching line, e.g. `Sublime Text.app`.
fn app_mentions(info: &str) -> Vec<&str> {
    info.lines()
        .filter_map(|line| {
            let end = line.to_ascii_lowercase().rfind(".app")? + ".app".len();
            line.get(..end).filter(|m| m.len() > ".app".len())
        })
        .collect()
}

/// Lazily filled, shareable set of lower-cased installed package names.
pub type PackageCatalog = Arc<OnceLock<HashSet<String>>>;

/// Handle to the Homebrew installation.
#[derive(Debug)]
pub struct Homebrew<'a> {
    executor: &'a dyn Executor,
    candidates: Vec<PathBuf>,
    applications_dir: PathBuf,
    installed: PackageCatalog,
}

impl<'a> Homebrew<'a> {
    /// Create a handle using the standard install locations.
    #[must_use]
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self {
            executor,
            candidates: BREW_CANDIDATES.iter().map(PathBuf::from).collect(),
            applications_dir: PathBuf::from(APPLICATIONS_DIR),
            installed: PackageCatalog::default(),
        }
    }

    /// Share an installed-package cache with other handles.
    #[must_use]
    pub fn with_catalog(mut self, catalog: PackageCatalog) -> Self {
        self.installed = catalog;
        self
    }

    /// Override the executable search locations.
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Override the directory searched for application bundles.
    #[must_use]
    pub fn with_applications_dir(mut self, dir: PathBuf) -> Self {
        self.applications_dir = dir;
        self
    }

    /// First existing brew executable, if any.
    #[must_use]
    pub fn resolve_executable(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.exists())
    }

    /// Path to brew, or a fatal [`ProvisionError::ToolNotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error when no candidate location exists.
    pub fn executable(&self) -> Result<String> {
        self.resolve_executable()
            .map(|p| p.to_string_lossy().into_owned())
            .ok_or_else(|| ProvisionError::ToolNotFound("Brew".to_string()).into())
    }

    /// Lower-cased names from `brew list`, queried on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if brew is missing or `brew list` fails.
    pub fn installed_packages(&self) -> Result<&HashSet<String>> {
        if let Some(set) = self.installed.get() {
            return Ok(set);
        }
        let brew = self.executable()?;
        let listed = self.executor.probe(&brew, &["list"])?;
        let set: HashSet<String> = listed
            .stdout
            .lines()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(self.installed.get_or_init(|| set))
    }

    /// Existing bundles referenced by `brew info` output, checked as given
    /// and under the applications directory.
    #[must_use]
    pub fn existing_apps(&self, info: &str) -> BTreeSet<PathBuf> {
        app_mentions(info)
            .into_iter()
            .filter_map(|name| {
                let direct = PathBuf::from(name);
                if direct.exists() {
                    return Some(direct);
                }
                let under = self.applications_dir.join(name);
                under.exists().then_some(under)
            })
            .collect()
    }

    /// Install a formula unless already present.
    ///
    /// # Errors
    ///
    /// Returns an error if brew is missing or the install fails.
    pub fn install_formula(&self, name: &str) -> Result<ResourceChange> {
        converge(&PackageResource::new(self, name, PackageKind::Formula))
    }

    /// Install a cask unless it or its application is already present.
    ///
    /// # Errors
    ///
    /// Returns an error if brew is missing or the install fails.
    pub fn install_cask(&self, name: &str) -> Result<ResourceChange> {
        converge(&PackageResource::new(self, name, PackageKind::Cask))
    }

    /// Install every package in `names`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first install error.
    pub fn install_list<S: AsRef<str>>(
        &self,
        names: &[S],
        kind: PackageKind,
    ) -> Result<Vec<(String, ResourceChange)>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let change = converge(&PackageResource::new(self, name, kind))
                    .with_context(|| format!("installing {kind} {name}"))?;
                Ok((name.to_string(), change))
            })
            .collect()
    }

    /// Install the packages listed in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MissingFile`] if `path` does not exist, or
    /// the first install error.
    pub fn install_list_file(
        &self,
        path: &Path,
        kind: PackageKind,
    ) -> Result<Vec<(String, ResourceChange)>> {
        if !path.exists() {
            return Err(ProvisionError::MissingFile(path.to_path_buf()).into());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        self.install_list(&parse_list(&text), kind)
    }

    /// Bootstrap Homebrew when no executable is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the install script fails.
    pub fn install_homebrew(&self) -> Result<ResourceChange> {
        converge(&HomebrewInstall { brew: self })
    }

    /// Opt out of Homebrew analytics.
    ///
    /// # Errors
    ///
    /// Returns an error if brew is missing or a brew command fails.
    pub fn analytics_off(&self) -> Result<ResourceChange> {
        converge(&Analytics { brew: self })
    }
}

/// A single formula or cask.
#[derive(Debug)]
pub struct PackageResource<'b, 'a> {
    brew: &'b Homebrew<'a>,
    name: String,
    kind: PackageKind,
}

impl<'b, 'a> PackageResource<'b, 'a> {
    /// Create a package resource.
    #[must_use]
    pub fn new(brew: &'b Homebrew<'a>, name: &str, kind: PackageKind) -> Self {
        Self {
            brew,
            name: name.to_string(),
            kind,
        }
    }

    fn cask_state(&self, brew: &str) -> Result<ResourceState> {
        let info = self.brew.executor.probe_unchecked(brew, &["info", &self.name])?;
        if info.success && !info.stdout.contains("Not installed") {
            return Ok(ResourceState::Correct);
        }
        if self.brew.existing_apps(&info.stdout).is_empty() {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Correct)
        }
    }
}

impl Applicable for PackageResource<'_, '_> {
    fn description(&self) -> String {
        format!("{} {}", self.kind, self.name)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let brew = self.brew.executable()?;
        match self.kind {
            PackageKind::Formula => self.brew.executor.run(&brew, &["install", &self.name])?,
            PackageKind::Cask => self
                .brew
                .executor
                .run(&brew, &["install", "--cask", &self.name])?,
        };
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PackageResource<'_, '_> {
    fn current_state(&self) -> Result<ResourceState> {
        if self
            .brew
            .installed_packages()?
            .contains(&self.name.to_lowercase())
        {
            return Ok(ResourceState::Correct);
        }
        match self.kind {
            PackageKind::Formula => Ok(ResourceState::Missing),
            PackageKind::Cask => self.cask_state(&self.brew.executable()?),
        }
    }
}

/// Presence of the brew executable itself.
#[derive(Debug)]
struct HomebrewInstall<'b, 'a> {
    brew: &'b Homebrew<'a>,
}

impl Applicable for HomebrewInstall<'_, '_> {
    fn description(&self) -> String {
        "homebrew".to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        // brew refuses to run as root
        self.brew
            .executor
            .run_script(&[BREW_INSTALL_SCRIPT.to_string()], false, true)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for HomebrewInstall<'_, '_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(if self.brew.resolve_executable().is_some() {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}

/// Homebrew analytics opt-out.
#[derive(Debug)]
struct Analytics<'b, 'a> {
    brew: &'b Homebrew<'a>,
}

impl Applicable for Analytics<'_, '_> {
    fn description(&self) -> String {
        "homebrew analytics off".to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        let brew = self.brew.executable()?;
        self.brew.executor.run(&brew, &["analytics", "off"])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for Analytics<'_, '_> {
    fn current_state(&self) -> Result<ResourceState> {
        let brew = self.brew.executable()?;
        let status = self.brew.executor.probe(&brew, &["analytics"])?;
        if status.stdout.contains("disabled") && status.stdout.contains("destroyed") {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: status.stdout,
            })
        }
    }
}
