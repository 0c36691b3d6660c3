//! Idempotent resource primitives (check + apply pattern).
//!
//! Each resource reads live OS state, compares it with the desired value and
//! mutates only on divergence. [`converge`] is the single place that turns a
//! [`ResourceState`] into an action.
pub mod apps;
pub mod defaults;
pub mod directory;
pub mod file_assoc;
pub mod helpers;
pub mod notifications;
pub mod package;
pub mod scutil;
pub mod screen_lock;
pub mod shell;
pub mod symlink;
pub mod timezone;
pub mod value;

use anyhow::Result;

/// Minimal interface for resources that can be described and applied.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Bring the resource to its desired state.
    ///
    /// Called only after [`Resource::current_state`] reported a divergence.
    ///
    /// # Errors
    ///
    /// Returns an error if a mutating command fails or a required file is
    /// missing. Such errors abort the provisioning run.
    fn apply(&self) -> Result<ResourceChange>;
}

/// State of a resource (preference key, package, link, etc.).
///
/// # Examples
///
/// ```
/// use automac_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "0".into() };
/// let skip = ResourceState::Invalid { reason: "app not found".into() };
///
/// assert_ne!(missing, correct);
/// assert_eq!(correct, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist or is not present.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// The current value of the resource.
        current: String,
    },
    /// Resource cannot be applied; the run continues with a warning.
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// Result of converging a resource.
///
/// # Examples
///
/// ```
/// use automac_cli::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let noop = ResourceChange::AlreadyCorrect;
/// let skipped = ResourceChange::Skipped { reason: "flags missing".into() };
///
/// assert_eq!(applied, ResourceChange::Applied);
/// assert_ne!(applied, noop);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was skipped (e.g., app not installed, flags field absent).
    Skipped {
        /// Reason why the resource was skipped.
        reason: String,
    },
}

/// Unified interface for resources that can be checked and applied.
///
/// # Examples
///
/// ```ignore
/// // All resources follow the same check-then-apply pattern:
/// let state = resource.current_state()?;
/// if resource.needs_change()? {
///     resource.apply()?;
/// }
/// ```
pub trait Resource: Applicable {
    /// Check the current state of the resource.
    ///
    /// Only non-mutating commands may be issued here.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined (a checked probe
    /// failed or a prerequisite file is missing).
    fn current_state(&self) -> Result<ResourceState>;

    /// Determine if the resource needs to be changed.
    ///
    /// # Errors
    ///
    /// Propagates errors from `current_state()`.
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}

/// Check a resource and apply it only when it diverges.
///
/// # Errors
///
/// Propagates errors from [`Resource::current_state`] and
/// [`Applicable::apply`].
pub fn converge(resource: &dyn Resource) -> Result<ResourceChange> {
    match resource.current_state()? {
        ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
        ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
        ResourceState::Missing | ResourceState::Incorrect { .. } => resource.apply(),
    }
}

/// Shared test helpers for resource unit tests.
///
/// Provides a scripted [`MockExecutor`] so individual resource test modules
/// do not have to duplicate the boilerplate.
#[cfg(test)]
pub mod test_helpers {
    use crate::exec::{Effect, ExecResult, Executor, render_command};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// One recorded executor invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Call {
        /// Whether the call was a probe or a mutation.
        pub effect: Effect,
        /// Program followed by its arguments.
        pub argv: Vec<String>,
    }

    /// A scripted mock executor for resource unit tests.
    ///
    /// Maintains a queue of `(success, stdout)` responses consumed in FIFO
    /// order. When the queue is empty any call returns a failed response
    /// (`success = false`, stdout = `"unexpected call"`). Every call is
    /// recorded so tests can assert on the exact commands issued.
    #[derive(Debug, Default)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        calls: Mutex<Vec<Call>>,
        which_result: bool,
    }

    impl MockExecutor {
        /// Create a mock with a single successful response.
        #[must_use]
        pub fn ok(stdout: &str) -> Self {
            Self::with_responses(vec![(true, stdout.to_string())])
        }

        /// Create a mock with a single failed response (empty stdout).
        #[must_use]
        pub fn fail() -> Self {
            Self::with_responses(vec![(false, String::new())])
        }

        /// Create a mock from an ordered list of `(success, stdout)` pairs.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                which_result: false,
            }
        }

        /// Create a mock from `(success, stdout)` string-slice pairs.
        #[must_use]
        pub fn script(responses: &[(bool, &str)]) -> Self {
            Self::with_responses(
                responses
                    .iter()
                    .map(|(ok, out)| (*ok, (*out).to_string()))
                    .collect(),
            )
        }

        /// Set the value returned by every [`Executor::which`] call.
        #[must_use]
        pub const fn with_which(mut self, result: bool) -> Self {
            self.which_result = result;
            self
        }

        /// Return every call made so far.
        #[must_use]
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().map_or_else(|_| vec![], |g| g.clone())
        }

        /// Return every call rendered as a shell-quoted command line.
        #[must_use]
        pub fn commands(&self) -> Vec<String> {
            self.calls()
                .iter()
                .map(|c| shell_words::join(&c.argv))
                .collect()
        }

        /// Return the total number of executor calls made so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls().len()
        }

        /// Return the number of mutating calls made so far.
        #[must_use]
        pub fn mutation_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.effect == Effect::Mutate)
                .count()
        }

        /// Return the number of read-only calls made so far.
        #[must_use]
        pub fn probe_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.effect == Effect::Probe)
                .count()
        }

        /// Return the number of scripted responses not yet consumed.
        #[must_use]
        pub fn remaining(&self) -> usize {
            self.responses.lock().map_or(0, |g| g.len())
        }

        fn next(&self, effect: Effect, program: &str, args: &[&str]) -> ExecResult {
            if let Ok(mut guard) = self.calls.lock() {
                guard.push(Call {
                    effect,
                    argv: std::iter::once(program)
                        .chain(args.iter().copied())
                        .map(String::from)
                        .collect(),
                });
            }
            let (success, stdout) = self.responses.lock().map_or_else(
                |_| (false, "mutex poisoned".to_string()),
                |mut guard| {
                    guard
                        .pop_front()
                        .unwrap_or_else(|| (false, "unexpected call".to_string()))
                },
            );
            ExecResult {
                stdout,
                stderr: String::new(),
                success,
                code: Some(i32::from(!success)),
            }
        }
    }

    impl Executor for MockExecutor {
        fn capture(
            &self,
            effect: Effect,
            program: &str,
            args: &[&str],
        ) -> anyhow::Result<ExecResult> {
            Ok(self.next(effect, program, args))
        }

        fn interactive(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            let mut result = self.next(Effect::Mutate, program, args);
            result.stdout.clear();
            Ok(result)
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }

    #[test]
    fn mock_renders_commands() {
        let mock = MockExecutor::ok("1");
        let _ = mock.probe_unchecked("defaults", &["read", "com.apple.dock", "autohide"]);
        assert_eq!(
            mock.commands(),
            vec![render_command(
                "defaults",
                &["read", "com.apple.dock", "autohide"]
            )]
        );
        assert_eq!(mock.probe_count(), 1);
        assert_eq!(mock.mutation_count(), 0);
    }
}
