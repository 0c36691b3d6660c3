//! Task that sets the login shell.

use anyhow::Result;
use std::path::PathBuf;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::shell::{LoginShellResource, ShellRegistration};
use crate::resources::{Applicable, Resource, ResourceState};

/// Register the desired shell and make it the user's login shell.
#[derive(Debug)]
pub struct ConfigureLoginShell;

impl Task for ConfigureLoginShell {
    fn name(&self) -> &'static str {
        "Configure login shell"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.manifest.login_shell.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(shell) = ctx.manifest.login_shell.as_deref().map(PathBuf::from) else {
            return Ok(TaskResult::Skipped("no login shell".to_string()));
        };
        let mut stats = TaskStats::new();

        let registration = ShellRegistration::new(shell.clone(), &*ctx.executor)
            .with_shells_file(ctx.shells_file.clone());
        stats.converge(ctx, &registration)?;

        let login = LoginShellResource::new(shell, &ctx.user, &*ctx.executor);
        match login.current_state()? {
            ResourceState::Missing => {
                ctx.log.warn(&format!(
                    "Failed to determine login shell for user {}",
                    ctx.user
                ));
                stats.skipped += 1;
            }
            ResourceState::Correct => stats.already_ok += 1,
            state => {
                ctx.log.debug(&format!("{}: {state:?}", login.description()));
                let change = login.apply()?;
                stats.record(ctx, &login.description(), change);
                ctx.add_manual_step("New shell session required");
            }
        }
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{Harness, harness};

    /// A shell binary in its own temp dir, so its path is known before the
    /// mock responses are scripted.
    fn shell_binary() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let shell = dir.path().join("bash");
        std::fs::write(&shell, "").unwrap();
        let shell = shell.display().to_string();
        (dir, shell)
    }

    fn shell_harness(shell: &str, exec: MockExecutor, listed: bool) -> Harness {
        let h = harness(&format!("login_shell = \"{shell}\""), exec);
        let shells = if listed {
            format!("/bin/zsh\n{shell}\n")
        } else {
            "/bin/zsh\n".to_string()
        };
        std::fs::write(&h.ctx.shells_file, shells).unwrap();
        h
    }

    #[test]
    fn registered_current_shell_is_noop() {
        let (_dir, shell) = shell_binary();
        let h = shell_harness(&shell, MockExecutor::ok(&format!("UserShell: {shell}")), true);
        ConfigureLoginShell.run(&h.ctx).unwrap();
        assert_eq!(h.exec.mutation_count(), 0);
        assert!(h.ctx.manual_steps().is_empty());
        assert_eq!(h.log.at("info").last().unwrap(), "0 changed, 2 already ok");
    }

    #[test]
    fn unlisted_shell_is_appended_then_changed() {
        let (_dir, shell) = shell_binary();
        let h = shell_harness(
            &shell,
            MockExecutor::script(&[(true, ""), (true, "UserShell: /bin/zsh"), (true, "")]),
            false,
        );
        ConfigureLoginShell.run(&h.ctx).unwrap();
        let calls = h.exec.calls();
        assert_eq!(calls[0].argv[..4], ["sudo", "-S", "--", "bash"]);
        let script = std::fs::read_to_string(&calls[0].argv[4]).unwrap();
        assert!(script.contains("tee -a"));
        std::fs::remove_file(&calls[0].argv[4]).unwrap();
        assert_eq!(h.exec.commands()[2], format!("chsh -s {shell} tester"));
        assert_eq!(h.ctx.manual_steps(), ["New shell session required"]);
    }

    #[test]
    fn unreadable_login_shell_warns() {
        let (_dir, shell) = shell_binary();
        let h = shell_harness(&shell, MockExecutor::fail(), true);
        ConfigureLoginShell.run(&h.ctx).unwrap();
        assert_eq!(h.log.at("warn"), ["Failed to determine login shell for user tester"]);
        assert_eq!(h.exec.mutation_count(), 0);
    }

    #[test]
    fn missing_shell_binary_is_fatal() {
        let h = harness("login_shell = \"/nonexistent/bin/fish\"", MockExecutor::default());
        let err = ConfigureLoginShell.run(&h.ctx).unwrap_err();
        assert!(err.to_string().starts_with("Missing file"));
    }
}
