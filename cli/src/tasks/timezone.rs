//! Task that sets the system timezone.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::timezone::TimezoneResource;

/// Set the system timezone.
#[derive(Debug)]
pub struct ConfigureTimezone;

impl Task for ConfigureTimezone {
    fn name(&self) -> &'static str {
        "Configure timezone"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.manifest.timezone.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(zone) = ctx.manifest.timezone.as_deref() else {
            return Ok(TaskResult::Skipped("no timezone".to_string()));
        };
        let mut stats = TaskStats::new();
        stats.converge(ctx, &TimezoneResource::new(zone, &*ctx.executor))?;
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::harness;

    #[test]
    fn differing_zone_is_set() {
        let h = harness(
            "timezone = \"Europe/Berlin\"",
            MockExecutor::script(&[(true, "/var/db/timezone/zoneinfo/UTC"), (true, "")]),
        );
        ConfigureTimezone.run(&h.ctx).unwrap();
        assert_eq!(
            h.exec.commands()[1],
            "sudo -S -- systemsetup -settimezone Europe/Berlin"
        );
        assert_eq!(h.log.at("info"), ["changed: timezone Europe/Berlin", "1 changed, 0 already ok"]);
    }

    #[test]
    fn unreadable_localtime_is_fatal() {
        let h = harness("timezone = \"Europe/Berlin\"", MockExecutor::fail());
        assert!(ConfigureTimezone.run(&h.ctx).is_err());
        assert_eq!(h.exec.mutation_count(), 0);
    }
}
