//! Password-on-wake screen lock, via `sysadminctl`.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

const SYSADMINCTL: &str = "sysadminctl";

/// Status text reported when no password is required after sleep.
pub const SCREEN_LOCK_OFF: &str = "screenLock is off";

/// The screen lock switched off.
///
/// `sysadminctl` reports status on stderr, so both streams are searched.
/// Switching off asks for the user's password on the terminal (`-password -`);
/// no password is ever taken from the manifest.
#[derive(Debug)]
pub struct ScreenLockOff<'a> {
    executor: &'a dyn Executor,
}

impl<'a> ScreenLockOff<'a> {
    /// Create the resource.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }
}

impl Applicable for ScreenLockOff<'_> {
    fn description(&self) -> String {
        "screen lock off".to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor.run_interactive(
            SYSADMINCTL,
            &["-screenLock", "off", "-password", "-"],
            true,
        )?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ScreenLockOff<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let status = self.executor.probe(SYSADMINCTL, &["-screenLock", "status"])?;
        if status.stdout.contains(SCREEN_LOCK_OFF) || status.stderr.contains(SCREEN_LOCK_OFF) {
            return Ok(ResourceState::Correct);
        }
        let current = status
            .stderr
            .lines()
            .chain(status.stdout.lines())
            .find(|l| l.contains("screenLock"))
            .unwrap_or("screen lock on")
            .trim()
            .to_string();
        Ok(ResourceState::Incorrect { current })
    }
}
