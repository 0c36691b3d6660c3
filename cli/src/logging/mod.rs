//! Console and run-log output.
//!
//! Everything goes through [`tracing`]: stage headers, plain messages,
//! subprocess audit lines ([`AUDIT_TARGET`]) and the task summary each have
//! their own rendering on the console and in the per-command log file.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::{AUDIT_TARGET, init_subscriber};
pub use types::{Log, RunReport, TaskEntry, TaskStatus};

/// Serializes `AUTOMAC_LOG_DIR` manipulation across parallel test threads.
#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// A [`Logger`] whose file layer writes into a fresh temp directory, with
/// a thread-local subscriber so events reach that file.
///
/// Keep the returned guard alive for the duration of the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let env_lock = TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: Protected by TEST_ENV_MUTEX; removed before the lock is released.
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var(utils::LOG_DIR_ENV, tmp.path());
    }
    let file_layer = subscriber::FileLayer::new("test").expect("failed to create file layer");
    let log = Logger::new("test");
    // SAFETY: As above.
    #[allow(unsafe_code)]
    unsafe {
        std::env::remove_var(utils::LOG_DIR_ENV);
    }
    drop(env_lock);
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}
