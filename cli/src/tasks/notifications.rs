//! Task that configures notification permissions.

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult, TaskStats};

/// Toggle per-app notification permissions.
#[derive(Debug)]
pub struct ConfigureNotifications;

impl Task for ConfigureNotifications {
    fn name(&self) -> &'static str {
        "Configure notifications"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.notifications.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let registry = ctx.notifications();
        let mut stats = TaskStats::new();
        for entry in &ctx.manifest.notifications {
            let (label, change) = match (&entry.app, &entry.bundle_id) {
                (Some(app), _) => (app.as_str(), registry.set_app(app, entry.enabled)),
                (None, Some(bundle)) => (
                    bundle.as_str(),
                    registry.set_enabled(bundle, entry.path.as_deref(), entry.enabled),
                ),
                (None, None) => continue,
            };
            let change = change.with_context(|| format!("notifications for {label}"))?;
            stats.record(ctx, label, change);
        }
        if registry.reload_pending() {
            ctx.log.debug("notification services will be restarted at the end of the run");
        }
        Ok(stats.finish(ctx))
    }
}
