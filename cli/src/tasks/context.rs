use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::config::Manifest;
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::defaults::KeyValueStore;
use crate::resources::helpers::fs::expand_tilde;
use crate::resources::notifications::{NotificationRegistry, store_path};
use crate::resources::package::{APPLICATIONS_DIR, BREW_CANDIDATES, Homebrew, PackageCatalog};
use crate::resources::shell::ETC_SHELLS;

/// The invoking user's home directory from `HOME`.
///
/// # Errors
///
/// Returns an error if the HOME environment variable is not set.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))
}

/// Login name from `USER`, falling back to the home directory's name.
#[must_use]
pub fn current_user(home: &Path) -> String {
    std::env::var("USER").unwrap_or_else(|_| {
        home.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Shared context for task execution.
pub struct Context {
    /// The manifest being applied.
    pub manifest: Arc<Manifest>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// User's home directory path.
    pub home: PathBuf,
    /// Login name of the user being provisioned.
    pub user: String,
    /// Directory searched for application bundles.
    pub applications_dir: PathBuf,
    /// Locations probed for the brew executable.
    pub brew_candidates: Vec<PathBuf>,
    /// File listing permitted login shells.
    pub shells_file: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Set when the notification store was modified and services need a
    /// restart at the end of a successful run.
    pub pending_reload: Arc<AtomicBool>,
    package_catalog: PackageCatalog,
    manual_steps: Mutex<Vec<String>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("manifest", &"<Manifest>")
            .field("log", &"<dyn Log>")
            .field("home", &self.home)
            .field("user", &self.user)
            .field("applications_dir", &self.applications_dir)
            .field("executor", &"<dyn Executor>")
            .field("pending_reload", &self.pending_reload)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a new context for task execution.
    ///
    /// The manifest's own manual steps are queued first.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME environment variable is not set.
    pub fn new(manifest: Arc<Manifest>, log: Arc<dyn Log>, executor: Arc<dyn Executor>) -> Result<Self> {
        let home = home_dir()?;
        let user = current_user(&home);
        Ok(Self::with_home(manifest, log, executor, home, user))
    }

    /// Creates a context for an explicit home directory and user.
    #[must_use]
    pub fn with_home(
        manifest: Arc<Manifest>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        home: PathBuf,
        user: String,
    ) -> Self {
        let applications_dir = manifest
            .applications_dir
            .as_deref()
            .map_or_else(|| PathBuf::from(APPLICATIONS_DIR), |d| expand_tilde(d, &home));
        let manual_steps = Mutex::new(manifest.manual_steps.clone());
        Self {
            manifest,
            log,
            home,
            user,
            applications_dir,
            brew_candidates: BREW_CANDIDATES.iter().map(PathBuf::from).collect(),
            shells_file: PathBuf::from(ETC_SHELLS),
            executor,
            pending_reload: Arc::new(AtomicBool::new(false)),
            package_catalog: PackageCatalog::default(),
            manual_steps,
        }
    }

    /// Expand a manifest path (`~` to the home directory).
    #[must_use]
    pub fn expand(&self, path: &str) -> PathBuf {
        expand_tilde(path, &self.home)
    }

    /// Homebrew handle bound to this context.
    ///
    /// Handles share one installed-package cache, so `brew list` runs at
    /// most once per context.
    #[must_use]
    pub fn homebrew(&self) -> Homebrew<'_> {
        Homebrew::new(&*self.executor)
            .with_candidates(self.brew_candidates.clone())
            .with_applications_dir(self.applications_dir.clone())
            .with_catalog(Arc::clone(&self.package_catalog))
    }

    /// Preference store bound to this context.
    #[must_use]
    pub fn defaults(&self) -> KeyValueStore<'_> {
        KeyValueStore::new(&*self.executor)
    }

    /// Notification registry sharing this context's reload flag.
    #[must_use]
    pub fn notifications(&self) -> NotificationRegistry<'_> {
        NotificationRegistry::new(
            &*self.executor,
            store_path(&self.home),
            self.applications_dir.clone(),
            Arc::clone(&self.pending_reload),
        )
    }

    /// Queue a step the user must perform by hand.
    pub fn add_manual_step(&self, step: &str) {
        if let Ok(mut guard) = self.manual_steps.lock()
            && !guard.iter().any(|s| s == step)
        {
            guard.push(step.to_string());
        }
    }

    /// Every queued manual step, in order.
    #[must_use]
    pub fn manual_steps(&self) -> Vec<String> {
        self.manual_steps.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}
