//! Task that launches configured apps.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::ResourceChange;
use crate::resources::apps::{RunningAppResource, find_app_path};

/// Start apps that are not already running.
#[derive(Debug)]
pub struct LaunchApps;

impl Task for LaunchApps {
    fn name(&self) -> &'static str {
        "Launch apps"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.launch_apps.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for app in &ctx.manifest.launch_apps {
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
            stats.converge(ctx, &RunningAppResource::new(path, &*ctx.executor))?;
        }
        Ok(stats.finish(ctx))
    }
}
