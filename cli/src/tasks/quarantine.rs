//! Task that clears quarantine flags.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::ResourceChange;
use crate::resources::apps::{QuarantineResource, find_app_path};

/// Clear the Gatekeeper quarantine flag from installed apps.
#[derive(Debug)]
pub struct RemoveQuarantine;

impl Task for RemoveQuarantine {
    fn name(&self) -> &'static str {
        "Remove quarantine"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.quarantine.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for app in &ctx.manifest.quarantine {
            let Some(path) = find_app_path(&ctx.applications_dir, app) else {
                stats.record(
                    ctx,
                    app,
                    ResourceChange::Skipped {
                        reason: format!("Missing app `{app}`"),
                    },
                );
                continue;
            };
            stats.converge(ctx, &QuarantineResource::new(path, &*ctx.executor))?;
        }
        Ok(stats.finish(ctx))
    }
}
