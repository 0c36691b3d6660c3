//! Task that disables the screen lock.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::screen_lock::ScreenLockOff;

/// Stop requiring a password after sleep or screen saver.
#[derive(Debug)]
pub struct DisableScreenLock;

impl Task for DisableScreenLock {
    fn name(&self) -> &'static str {
        "Disable screen lock"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.manifest.screen_lock_off
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        stats.converge(ctx, &ScreenLockOff::new(&*ctx.executor))?;
        Ok(stats.finish(ctx))
    }
}
