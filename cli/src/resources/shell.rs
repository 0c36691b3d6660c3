//! Login shell resources.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ProvisionError;
use crate::exec::Executor;

/// System list of permitted login shells.
pub const ETC_SHELLS: &str = "/etc/shells";

/// Validate a desired shell path: absolute and present on disk.
///
/// # Errors
///
/// Returns an error for a relative or missing path.
pub fn validate_shell_path(shell: &Path) -> Result<()> {
    if !shell.is_absolute() {
        return Err(ProvisionError::invalid_state(shell.display(), "shell path must be absolute").into());
    }
    if !shell.exists() {
        return Err(ProvisionError::MissingFile(shell.to_path_buf()).into());
    }
    Ok(())
}

/// Registration of a shell in `/etc/shells`.
#[derive(Debug)]
pub struct ShellRegistration<'a> {
    shell: PathBuf,
    shells_file: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> ShellRegistration<'a> {
    /// Create a registration for `shell` in the system shells file.
    #[must_use]
    pub fn new(shell: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            shell,
            shells_file: PathBuf::from(ETC_SHELLS),
            executor,
        }
    }

    /// Override the shells file location.
    #[must_use]
    pub fn with_shells_file(mut self, path: PathBuf) -> Self {
        self.shells_file = path;
        self
    }
}

impl Applicable for ShellRegistration<'_> {
    fn description(&self) -> String {
        format!("{} in {}", self.shell.display(), self.shells_file.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let line = format!(
            "echo {} | tee -a {}",
            shell_words::quote(&self.shell.to_string_lossy()),
            shell_words::quote(&self.shells_file.to_string_lossy())
        );
        self.executor
            .run_script(&["set -x".to_string(), line], true, true)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ShellRegistration<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        validate_shell_path(&self.shell)?;
        let listed = std::fs::read_to_string(&self.shells_file)
            .with_context(|| format!("reading {}", self.shells_file.display()))?;
        let wanted = self.shell.to_string_lossy();
        if listed.lines().any(|l| l.trim() == wanted) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}

/// The user's login shell as recorded in the directory service.
///
/// [`ResourceState::Missing`] means the current shell could not be read.
#[derive(Debug)]
pub struct LoginShellResource<'a> {
    shell: PathBuf,
    user: String,
    executor: &'a dyn Executor,
}

impl<'a> LoginShellResource<'a> {
    /// Create a login shell resource for `user`.
    #[must_use]
    pub fn new(shell: PathBuf, user: &str, executor: &'a dyn Executor) -> Self {
        Self {
            shell,
            user: user.to_string(),
            executor,
        }
    }

    /// Read the current login shell, e.g. `/bin/zsh`.
    ///
    /// # Errors
    ///
    /// Returns an error only if `dscl` cannot be spawned.
    pub fn current_shell(&self) -> Result<Option<String>> {
        let record = format!("/Users/{}", self.user);
        let result = self
            .executor
            .probe_unchecked("dscl", &[".", "-read", &record, "UserShell"])?;
        if !result.success {
            return Ok(None);
        }
        // `UserShell: /bin/zsh`
        Ok(result.stdout.split_whitespace().nth(1).map(String::from))
    }
}

impl Applicable for LoginShellResource<'_> {
    fn description(&self) -> String {
        format!("login shell for {} -> {}", self.user, self.shell.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let shell = self.shell.to_string_lossy();
        self.executor.run("chsh", &["-s", &shell, &self.user])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for LoginShellResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(match self.current_shell()? {
            None => ResourceState::Missing,
            Some(current) if Path::new(&current) == self.shell => ResourceState::Correct,
            Some(current) => ResourceState::Incorrect { current },
        })
    }
}
