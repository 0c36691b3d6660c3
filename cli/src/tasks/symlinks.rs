//! Task that creates configured symlinks.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::symlink::SymlinkResource;

/// Link configuration files into place.
#[derive(Debug)]
pub struct InstallSymlinks;

impl Task for InstallSymlinks {
    fn name(&self) -> &'static str {
        "Install symlinks"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.symlinks.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for link in &ctx.manifest.symlinks {
            let resource = SymlinkResource::new(ctx.expand(&link.source), ctx.expand(&link.target));
            stats.converge(ctx, &resource)?;
        }
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::harness;

    const LINKS: &str = r#"
[[symlinks]]
source = "~/dotfiles/zshrc"
target = "~/.zshrc"

[[symlinks]]
source = "~/dotfiles/git"
target = "~/.config/git"
"#;

    #[test]
    fn links_are_created_then_left_alone() {
        let h = harness(LINKS, MockExecutor::default());
        std::fs::create_dir_all(h.home().join("dotfiles/git")).unwrap();
        std::fs::write(h.home().join("dotfiles/zshrc"), "").unwrap();

        InstallSymlinks.run(&h.ctx).unwrap();
        assert_eq!(
            std::fs::read_link(h.home().join(".zshrc")).unwrap(),
            h.home().join("dotfiles/zshrc")
        );
        assert!(h.home().join(".config/git").is_dir());

        InstallSymlinks.run(&h.ctx).unwrap();
        assert_eq!(h.log.at("info").last().unwrap(), "0 changed, 2 already ok");
    }

    #[test]
    fn missing_source_halts() {
        let h = harness(LINKS, MockExecutor::default());
        let err = InstallSymlinks.run(&h.ctx).unwrap_err();
        assert!(err.to_string().starts_with("Missing file"));
        assert!(h.home().join(".zshrc").symlink_metadata().is_err());
    }
}
