//! Named, ordered tasks that orchestrate resource changes.
mod context;
pub mod directories;
pub mod file_assoc;
pub mod homebrew;
pub mod identity;
pub mod launch;
pub mod notifications;
pub mod preferences;
pub mod quarantine;
pub mod screen_lock;
pub mod shell;
pub mod symlinks;
pub mod timezone;
pub mod unhide;

pub use context::{Context, current_user, home_dir};

use anyhow::Result;

use crate::logging::TaskStatus;
use crate::resources::{Resource, ResourceChange, converge};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use automac_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("brew already present".into());
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task decided there was nothing it could do.
    Skipped(String),
}

/// Counters for tasks that converge many resources.
///
/// # Examples
///
/// ```
/// use automac_cli::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default)]
pub struct TaskStats {
    /// Number of items changed.
    pub changed: u32,
    /// Number of items already in the desired state.
    pub already_ok: u32,
    /// Number of items skipped with a warning.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok").
    #[must_use]
    pub fn summary(&self) -> String {
        if self.skipped > 0 {
            format!(
                "{} changed, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} changed, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log and count the outcome of one resource.
    pub fn record(&mut self, ctx: &Context, description: &str, change: ResourceChange) {
        match change {
            ResourceChange::Applied => {
                ctx.log.info(&format!("changed: {description}"));
                self.changed += 1;
            }
            ResourceChange::AlreadyCorrect => {
                ctx.log.debug(&format!("ok: {description}"));
                self.already_ok += 1;
            }
            ResourceChange::Skipped { reason } => {
                ctx.log.warn(&format!("{description}: {reason}"));
                self.skipped += 1;
            }
        }
    }

    /// Converge `resource` and record the outcome.
    ///
    /// # Errors
    ///
    /// Propagates the resource error; the run halts.
    pub fn converge(&mut self, ctx: &Context, resource: &dyn Resource) -> Result<()> {
        let description = resource.description();
        let change = converge(resource)?;
        self.record(ctx, &description, change);
        Ok(())
    }

    /// Log the summary and return [`TaskResult::Ok`].
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary());
        TaskResult::Ok
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &'static str;

    /// Whether the manifest has anything for this task.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource cannot be brought to its desired state.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Every task, in execution order.
#[must_use]
pub fn all_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(homebrew::InstallHomebrew),
        Box::new(homebrew::InstallPackages),
        Box::new(directories::CreateDirectories),
        Box::new(symlinks::InstallSymlinks),
        Box::new(unhide::UnhideFolders),
        Box::new(identity::ConfigureIdentity),
        Box::new(screen_lock::DisableScreenLock),
        Box::new(timezone::ConfigureTimezone),
        Box::new(shell::ConfigureLoginShell),
        Box::new(preferences::ApplyPreferences),
        Box::new(quarantine::RemoveQuarantine),
        Box::new(launch::LaunchApps),
        Box::new(notifications::ConfigureNotifications),
        Box::new(file_assoc::AssociateFileTypes),
    ]
}

/// Filter tasks by `--only` / `--skip` (case-insensitive substrings).
///
/// `only` wins when both are given.
#[must_use]
pub fn select<'t>(tasks: &'t [Box<dyn Task>], only: &[String], skip: &[String]) -> Vec<&'t dyn Task> {
    tasks
        .iter()
        .filter(|t| {
            let name = t.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            !skip.iter().any(|s| name.contains(&s.to_lowercase()))
        })
        .map(AsRef::as_ref)
        .collect()
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Returns the task's error, prefixed with its name; the caller halts.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (nothing configured)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e.context(task.name()))
        }
    }
}

/// Run tasks in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first task error.
pub fn run_all<'t>(tasks: impl IntoIterator<Item = &'t dyn Task>, ctx: &Context) -> Result<()> {
    for task in tasks {
        execute(task, ctx)?;
    }
    Ok(())
}
