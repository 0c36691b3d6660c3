//! Task records, the run report and the [`Log`] seam used by tasks.

/// Outcome of one task, kept for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Task name as shown in the summary.
    pub name: String,
    /// Final status of the task.
    pub status: TaskStatus,
    /// Detail shown in parentheses, e.g. the error of a failed task.
    pub message: Option<String>,
}

/// Status of a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task completed successfully.
    Ok,
    /// The manifest has nothing for this task.
    NotApplicable,
    /// Task was skipped by its own logic.
    Skipped,
    /// Task encountered an error and halted the run.
    Failed,
}

impl TaskStatus {
    /// Every status, in summary order.
    pub const ALL: [Self; 4] = [Self::Ok, Self::NotApplicable, Self::Skipped, Self::Failed];

    /// Word used in summary counts and in the `status` field of summary rows.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotApplicable => "n/a",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Inverse of [`TaskStatus::label`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Marker printed before the task name.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::NotApplicable => "·",
            Self::Skipped => "○",
            Self::Failed => "✗",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened after the tasks ran, reported below the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Notification services were restarted to pick up store changes.
    pub services_restarted: bool,
    /// Number of steps the user still has to perform by hand.
    pub manual_steps: usize,
}

/// Logging seam.
///
/// Task code logs through this trait so tests can substitute a recorder.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a task result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
