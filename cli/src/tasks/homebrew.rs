//! Task that installs Homebrew packages.

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::package::PackageKind;

/// Bootstrap Homebrew and opt out of analytics.
#[derive(Debug)]
pub struct InstallHomebrew;

impl Task for InstallHomebrew {
    fn name(&self) -> &'static str {
        "Install Homebrew"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.manifest.homebrew.bootstrap || ctx.manifest.homebrew.analytics_off
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let brew = ctx.homebrew();
        let mut stats = TaskStats::new();
        if ctx.manifest.homebrew.bootstrap {
            stats.record(ctx, "homebrew", brew.install_homebrew()?);
        }
        if ctx.manifest.homebrew.analytics_off {
            stats.record(ctx, "homebrew analytics off", brew.analytics_off()?);
        }
        Ok(stats.finish(ctx))
    }
}

/// Install formulae and casks, inline and from list files.
#[derive(Debug)]
pub struct InstallPackages;

impl InstallPackages {
    fn install(
        ctx: &Context,
        stats: &mut TaskStats,
        names: &[String],
        lists: &[String],
        kind: PackageKind,
    ) -> Result<()> {
        let brew = ctx.homebrew();
        let mut results = brew.install_list(names, kind)?;
        for list in lists {
            let path = ctx.manifest.resolve_list_file(list, &ctx.home)?;
            ctx.log.debug(&format!("{kind} list: {}", path.display()));
            results.extend(brew.install_list_file(&path, kind)?);
        }
        for (name, change) in results {
            stats.record(ctx, &format!("{kind} {name}"), change);
        }
        Ok(())
    }
}

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.manifest.homebrew.has_packages()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let section = &ctx.manifest.homebrew;
        let mut stats = TaskStats::new();
        Self::install(
            ctx,
            &mut stats,
            &section.formulae,
            &section.formula_lists,
            PackageKind::Formula,
        )?;
        Self::install(
            ctx,
            &mut stats,
            &section.casks,
            &section.cask_lists,
            PackageKind::Cask,
        )?;
        Ok(stats.finish(ctx))
    }
}
