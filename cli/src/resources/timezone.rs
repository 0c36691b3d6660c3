//! System timezone resource.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// Symlink whose target names the active zone.
const LOCALTIME: &str = "/etc/localtime";

/// Prefix of the zoneinfo database in the `/etc/localtime` target.
const ZONEINFO_PREFIX: &str = "/var/db/timezone/zoneinfo/";

/// Zone name from a `/etc/localtime` link target.
#[must_use]
pub fn zone_from_link(target: &str) -> &str {
    target.strip_prefix(ZONEINFO_PREFIX).unwrap_or(target)
}

/// The system timezone, e.g. `Europe/Berlin`.
#[derive(Debug)]
pub struct TimezoneResource<'a> {
    zone: String,
    executor: &'a dyn Executor,
}

impl<'a> TimezoneResource<'a> {
    /// Create a timezone resource.
    #[must_use]
    pub fn new(zone: &str, executor: &'a dyn Executor) -> Self {
        Self {
            zone: zone.to_string(),
            executor,
        }
    }
}

impl Applicable for TimezoneResource<'_> {
    fn description(&self) -> String {
        format!("timezone {}", self.zone)
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor
            .sudo("systemsetup", &["-settimezone", &self.zone], true)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for TimezoneResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let link = self.executor.probe("readlink", &[LOCALTIME])?;
        let current = zone_from_link(&link.stdout);
        if current == self.zone {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: current.to_string(),
            })
        }
    }
}
