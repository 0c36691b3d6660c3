//! Task that ensures configured directories exist.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::directory::DirectoryResource;

/// Create the manifest's directories (`mkdir -p`).
#[derive(Debug)]
pub struct CreateDirectories;

impl Task for CreateDirectories {
    fn name(&self) -> &'static str {
        "Create directories"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.directories.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for dir in &ctx.manifest.directories {
            stats.converge(ctx, &DirectoryResource::new(ctx.expand(dir)))?;
        }
        Ok(stats.finish(ctx))
    }
}
