//! Log file location and timestamps.
use std::path::PathBuf;

/// Environment variable overriding the log directory.
pub(super) const LOG_DIR_ENV: &str = "AUTOMAC_LOG_DIR";

/// Directory holding run logs, created on demand.
///
/// `$AUTOMAC_LOG_DIR` when set and non-empty, else `~/Library/Logs/automac`.
pub(super) fn log_dir() -> Option<PathBuf> {
    let dir = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var_os("HOME")?).join("Library/Logs/automac"),
    };
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Log file of one command; each run overwrites the previous one.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    Some(log_dir()?.join(format!("{command}.log")))
}

/// Local wall-clock time for log lines.
pub(super) fn clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Local date, time and UTC offset for the run header.
pub(super) fn run_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string()
}

#[cfg(test)]
#[allow(unsafe_code)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn with_log_dir<T>(value: &std::ffi::OsStr, f: impl FnOnce() -> T) -> T {
        let _lock = crate::logging::TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: Protected by TEST_ENV_MUTEX; removed before the lock is released.
        unsafe {
            std::env::set_var(LOG_DIR_ENV, value);
        }
        let out = f();
        // SAFETY: As above.
        unsafe {
            std::env::remove_var(LOG_DIR_ENV);
        }
        out
    }

    #[test]
    fn override_directory_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs/automac");
        let path = with_log_dir(dir.as_os_str(), || log_file_path("apply"));
        assert_eq!(path.unwrap(), dir.join("apply.log"));
        assert!(dir.is_dir());
    }

    #[test]
    fn clock_is_hours_minutes_seconds() {
        let s = clock();
        assert_eq!(s.len(), 8);
        assert_eq!(s.matches(':').count(), 2);
    }

    #[test]
    fn run_stamp_carries_offset() {
        let s = run_stamp();
        let offset = s.rsplit(' ').next().unwrap();
        assert_eq!(offset.len(), 5);
        assert!(offset.starts_with('+') || offset.starts_with('-'));
    }
}
