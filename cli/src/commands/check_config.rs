//! Command: validate a manifest without touching the system.
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::ConfigOpts;
use crate::exec::SystemExecutor;
use crate::logging::Log;
use crate::tasks::{self, Context, home_dir};

/// Load and validate the manifest, then list the tasks it would run.
///
/// # Errors
///
/// Returns an error if the manifest is missing, unparsable or invalid.
pub fn run(opts: &ConfigOpts, log: &Arc<dyn Log>) -> Result<()> {
    let home = home_dir()?;
    let manifest = super::load_manifest(&opts.config, &home, log.as_ref())?;
    let ctx = Context::new(Arc::new(manifest), Arc::clone(log), Arc::new(SystemExecutor))?;
    for name in planned_tasks(&ctx) {
        log.info(&format!("would run: {name}"));
    }
    writeln!(std::io::stdout(), "OK").ok();
    Ok(())
}

/// Names of the tasks with something to do, in run order.
#[must_use]
pub fn planned_tasks(ctx: &Context) -> Vec<&'static str> {
    tasks::all_tasks()
        .iter()
        .filter(|t| t.should_run(ctx))
        .map(|t| t.name())
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::harness;

    #[test]
    fn plan_lists_configured_tasks_in_order() {
        let h = harness(
            "timezone = \"Europe/Berlin\"\ndirectories = [\"~/Projects\"]\n[homebrew]\nformulae = [\"git\"]",
            MockExecutor::default(),
        );
        assert_eq!(
            planned_tasks(&h.ctx),
            ["Install packages", "Create directories", "Configure timezone"]
        );
        assert_eq!(h.exec.call_count(), 0);
    }

    #[test]
    fn empty_manifest_plans_nothing() {
        let h = harness("", MockExecutor::default());
        assert!(planned_tasks(&h.ctx).is_empty());
    }
}
