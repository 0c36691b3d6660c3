//! Task that sets the machine's names.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::scutil::set_all_names;

/// Set the computer, host, local host and NetBIOS names.
#[derive(Debug)]
pub struct ConfigureIdentity;

impl Task for ConfigureIdentity {
    fn name(&self) -> &'static str {
        "Configure machine identity"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.manifest.computer_name.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(name) = ctx.manifest.computer_name.as_deref() else {
            return Ok(TaskResult::Skipped("no computer name".to_string()));
        };
        let mut stats = TaskStats::new();
        for (description, change) in set_all_names(&*ctx.executor, name)? {
            stats.record(ctx, &description, change);
        }
        Ok(stats.finish(ctx))
    }
}
