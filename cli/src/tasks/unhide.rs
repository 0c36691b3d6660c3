//! Task that unhides configured folders.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::directory::VisibleResource;

/// Clear the Finder hidden flag from the manifest's paths.
#[derive(Debug)]
pub struct UnhideFolders;

impl Task for UnhideFolders {
    fn name(&self) -> &'static str {
        "Unhide folders"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.unhide.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for path in &ctx.manifest.unhide {
            stats.converge(ctx, &VisibleResource::new(ctx.expand(path), &*ctx.executor))?;
        }
        Ok(stats.finish(ctx))
    }
}
