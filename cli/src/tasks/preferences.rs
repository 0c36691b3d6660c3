//! Task that applies `defaults` preferences.

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult, TaskStats};

/// Write and delete `defaults` preferences.
#[derive(Debug)]
pub struct ApplyPreferences;

impl Task for ApplyPreferences {
    fn name(&self) -> &'static str {
        "Apply preferences"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.preferences.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let store = ctx.defaults();
        let mut stats = TaskStats::new();
        for pref in &ctx.manifest.preferences {
            let label = format!("{} {}", pref.domain, pref.key);
            let change = match &pref.value {
                Some(value) if !pref.delete => {
                    store.write_value(&pref.domain, &pref.key, value, pref.current_host, pref.sudo)
                }
                _ => store.delete(&pref.domain, &pref.key),
            }
            .with_context(|| format!("preference {label}"))?;
            stats.record(ctx, &label, change);
        }
        Ok(stats.finish(ctx))
    }
}
