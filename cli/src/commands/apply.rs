//! Command: provision the machine from a manifest.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::ApplyOpts;
use crate::config::Manifest;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger, RunReport};
use crate::platform::Platform;
use crate::tasks::{self, Context, current_user, home_dir};

/// Run the apply command.
///
/// On success prints `OK` followed by any manual steps. The caller turns
/// an error into the `ABORT` completion state.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or any task fails.
pub fn run(opts: &ApplyOpts, log: &Arc<Logger>) -> Result<()> {
    let executor = Arc::new(SystemExecutor);
    let platform = Platform::detect(executor.as_ref());
    log.info(&format!(
        "automac {} on {platform}",
        super::version::version()
    ));
    if !platform.is_macos() {
        log.warn("not running on macOS; most commands will fail");
    } else if platform.major_version().is_some_and(|v| v < 13) {
        log.warn("notification defaults assume macOS 13 or later");
    }

    let home = home_dir()?;
    let manifest = super::load_manifest(&opts.manifest.config, &home, log.as_ref())?;
    let ctx = command_context(manifest, log, executor, home);

    let result = provision(&ctx, &opts.only, &opts.skip);
    log.print_summary(&run_report(&ctx, result.as_ref().ok().copied()));
    result?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "OK").ok();
    write_manual_steps(&mut out, &ctx.manual_steps()).ok();
    Ok(())
}

/// Context whose task records land in the command's own logger, so the
/// summary sees them.
#[must_use]
pub fn command_context(
    manifest: Manifest,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
    home: PathBuf,
) -> Context {
    let shared = Arc::clone(log) as Arc<dyn Log>;
    let user = current_user(&home);
    Context::with_home(Arc::new(manifest), shared, executor, home, user)
}

/// Summary footer for a run; `restarted` is `None` when the run failed, in
/// which case no manual steps are listed either.
#[must_use]
pub fn run_report(ctx: &Context, restarted: Option<bool>) -> RunReport {
    restarted.map_or_else(RunReport::default, |services_restarted| RunReport {
        services_restarted,
        manual_steps: ctx.manual_steps().len(),
    })
}

/// Run the selected tasks, then restart notification services if the
/// notification store changed. Returns whether services were restarted.
///
/// # Errors
///
/// Returns the first task error; the reload is not attempted then.
pub fn provision(ctx: &Context, only: &[String], skip: &[String]) -> Result<bool> {
    let all = tasks::all_tasks();
    let selected = tasks::select(&all, only, skip);
    ctx.log.debug(&format!(
        "{} of {} tasks selected",
        selected.len(),
        all.len()
    ));
    tasks::run_all(selected, ctx)?;
    let restarted = ctx.notifications().reload_if_pending()?;
    if restarted {
        ctx.log.debug("restarted notification services");
    }
    Ok(restarted)
}

/// Print the manual-steps block; nothing when `steps` is empty.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_manual_steps(out: &mut impl std::io::Write, steps: &[String]) -> std::io::Result<()> {
    if steps.is_empty() {
        return Ok(());
    }
    writeln!(out, "Manual setup required:")?;
    for step in steps {
        writeln!(out, "- {step}")?;
    }
    Ok(())
}
