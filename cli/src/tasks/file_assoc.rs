//! Task that sets default file-type handlers.

use anyhow::{Context as _, Result};
use std::path::Path;

use super::{Context, Task, TaskResult, TaskStats};
use crate::config::manifest::AssociationEntry;
use crate::error::ProvisionError;
use crate::resources::ResourceChange;
use crate::resources::apps::{bundle_id, find_app_path};
use crate::resources::file_assoc::{DUTI, FileAssociation, normalize_extension};

/// Make apps the default handlers for file extensions.
#[derive(Debug)]
pub struct AssociateFileTypes;

/// Locate `duti`: the Homebrew location first, then `PATH`.
fn resolve_duti(ctx: &Context) -> Result<String> {
    if Path::new(DUTI).exists() {
        Ok(DUTI.to_string())
    } else if ctx.executor.which("duti") {
        Ok("duti".to_string())
    } else {
        Err(ProvisionError::ToolNotFound("duti".to_string()).into())
    }
}

/// Bundle id for an entry, or `None` when its app is not installed.
fn entry_bundle_id(ctx: &Context, entry: &AssociationEntry) -> Result<Option<String>> {
    if let Some(id) = &entry.bundle_id {
        return Ok(Some(id.clone()));
    }
    let Some(app) = &entry.app else {
        return Ok(None);
    };
    let Some(path) = find_app_path(&ctx.applications_dir, app) else {
        return Ok(None);
    };
    let id = bundle_id(&*ctx.executor, &path.to_string_lossy())
        .with_context(|| format!("bundle id of {app}"))?;
    Ok((!id.is_empty()).then_some(id))
}

impl Task for AssociateFileTypes {
    fn name(&self) -> &'static str {
        "Associate file types"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.manifest.file_associations.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let duti = resolve_duti(ctx)?;
        let mut stats = TaskStats::new();
        for entry in &ctx.manifest.file_associations {
            let label = entry.app.as_deref().or(entry.bundle_id.as_deref()).unwrap_or_default();
            let Some(bundle) = entry_bundle_id(ctx, entry)? else {
                stats.record(
                    ctx,
                    label,
                    ResourceChange::Skipped {
                        reason: format!("Missing app `{label}`, extensions left unchanged"),
                    },
                );
                continue;
            };
            for raw in &entry.extensions {
                let Some(ext) = normalize_extension(raw) else {
                    stats.record(
                        ctx,
                        &format!("extension `{raw}`"),
                        ResourceChange::Skipped {
                            reason: "empty or dotted extensions are not supported".to_string(),
                        },
                    );
                    continue;
                };
                let association =
                    FileAssociation::new(ext, &bundle, entry.role, &*ctx.executor).with_duti(&duti);
                stats.converge(ctx, &association)?;
            }
        }
        Ok(stats.finish(ctx))
    }
}
