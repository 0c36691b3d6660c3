//! The command logger and its end-of-run summary.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{STAGE_TARGET, SUMMARY_TARGET};
use super::types::{Log, RunReport, TaskEntry, TaskStatus};
use super::utils::log_file_path;

/// [`Log`] backed by the global tracing subscriber.
///
/// Task outcomes are kept in memory until [`Logger::print_summary`]. The
/// file layer mirrors every line to `~/Library/Logs/automac/<command>.log`
/// (or `$AUTOMAC_LOG_DIR`), including debug output.
#[derive(Debug)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create the logger for `command`.
    ///
    /// Only remembers the log path for the summary; the file itself is
    /// opened by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Log file path, if one could be created.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Every recorded task outcome, in run order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Print one row per recorded task, the per-status totals, and what
    /// happened after the tasks ran. Prints nothing when there is nothing
    /// to report.
    pub fn print_summary(&self, report: &RunReport) {
        let tasks = self.task_entries();
        if tasks.is_empty() && *report == RunReport::default() {
            return;
        }

        writeln!(std::io::stdout()).ok();
        self.stage("Summary");
        for task in &tasks {
            let detail = task
                .message
                .as_deref()
                .map_or_else(String::new, |m| format!(" ({m})"));
            tracing::info!(
                target: SUMMARY_TARGET,
                status = task.status.label(),
                "{} {}{detail}",
                task.status.marker(),
                task.name
            );
        }

        let totals = TaskStatus::ALL
            .map(|s| format!("{} {s}", tasks.iter().filter(|t| t.status == s).count()))
            .join(", ");
        tracing::info!(target: SUMMARY_TARGET, "{} tasks: {totals}", tasks.len());

        if report.services_restarted {
            self.info("notification services restarted");
        }
        if report.manual_steps > 0 {
            self.info(&format!(
                "{} manual step(s) pending, listed below",
                report.manual_steps
            ));
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("log: {}", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.tasks.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
