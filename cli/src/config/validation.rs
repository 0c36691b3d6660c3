//! Semantic manifest validation.
use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use super::manifest::{
    AssociationEntry, HomebrewConfig, Manifest, PreferenceEntry, SymlinkEntry,
};
use crate::error::ProvisionError;
use crate::resources::file_assoc::normalize_extension;
use crate::resources::helpers::fs::expand_tilde;

/// A validation warning detected during manifest loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Manifest section (e.g. "symlinks", "homebrew").
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a new warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// A validator for one manifest section.
pub trait ConfigValidator {
    /// Validate the section and return any warnings found.
    fn validate(&self, home: &Path) -> Vec<ValidationWarning>;
}

/// Validator for symlink entries.
#[derive(Debug)]
pub struct SymlinkValidator<'a> {
    symlinks: &'a [SymlinkEntry],
}

impl ConfigValidator for SymlinkValidator<'_> {
    fn validate(&self, home: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut targets = HashSet::new();

        for link in self.symlinks {
            let source = expand_tilde(&link.source, home);
            if !source.exists() {
                warnings.push(ValidationWarning::new(
                    "symlinks",
                    &link.source,
                    format!("source does not exist: {}", source.display()),
                ));
            }
            if !targets.insert(expand_tilde(&link.target, home)) {
                warnings.push(ValidationWarning::new(
                    "symlinks",
                    &link.target,
                    "target listed more than once",
                ));
            }
        }

        warnings
    }
}

/// Validator for the Homebrew section.
#[derive(Debug)]
pub struct PackageValidator<'a> {
    homebrew: &'a HomebrewConfig,
}

impl ConfigValidator for PackageValidator<'_> {
    fn validate(&self, _home: &Path) -> Vec<ValidationWarning> {
        self.homebrew
            .formulae
            .iter()
            .chain(&self.homebrew.casks)
            .filter(|name| name.trim().is_empty())
            .map(|name| ValidationWarning::new("homebrew", name, "package name is empty"))
            .collect()
    }
}

/// Validator for preference entries.
#[derive(Debug)]
pub struct PreferenceValidator<'a> {
    entries: &'a [PreferenceEntry],
}

impl ConfigValidator for PreferenceValidator<'_> {
    fn validate(&self, _home: &Path) -> Vec<ValidationWarning> {
        self.entries
            .iter()
            .filter(|e| e.delete && (e.current_host || e.sudo))
            .map(|e| {
                ValidationWarning::new(
                    "preferences",
                    format!("{} {}", e.domain, e.key),
                    "current_host and sudo are ignored for deletions",
                )
            })
            .collect()
    }
}

/// Validator for file associations.
#[derive(Debug)]
pub struct AssociationValidator<'a> {
    entries: &'a [AssociationEntry],
}

impl ConfigValidator for AssociationValidator<'_> {
    fn validate(&self, _home: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for entry in self.entries {
            let app = app_label(entry.app.as_deref(), entry.bundle_id.as_deref());
            if entry.extensions.is_empty() {
                warnings.push(ValidationWarning::new("file_associations", app, "no extensions"));
            }
            for ext in &entry.extensions {
                if normalize_extension(ext).is_none() {
                    warnings.push(ValidationWarning::new(
                        "file_associations",
                        ext,
                        "extension is empty or dotted and will be skipped",
                    ));
                }
            }
        }
        warnings
    }
}

fn app_label<'s>(app: Option<&'s str>, bundle_id: Option<&'s str>) -> &'s str {
    app.or(bundle_id).unwrap_or("<unnamed>")
}

/// Run every section validator.
#[must_use]
pub fn validate_all(manifest: &Manifest, home: &Path) -> Vec<ValidationWarning> {
    let validators: Vec<Box<dyn ConfigValidator + '_>> = vec![
        Box::new(SymlinkValidator {
            symlinks: &manifest.symlinks,
        }),
        Box::new(PackageValidator {
            homebrew: &manifest.homebrew,
        }),
        Box::new(PreferenceValidator {
            entries: &manifest.preferences,
        }),
        Box::new(AssociationValidator {
            entries: &manifest.file_associations,
        }),
    ];

    validators.iter().flat_map(|v| v.validate(home)).collect()
}

fn invalid(msg: impl Into<String>) -> anyhow::Error {
    ProvisionError::InvalidConfig(msg.into()).into()
}

fn check_target(section: &str, app: Option<&str>, bundle_id: Option<&str>) -> Result<()> {
    match (app, bundle_id) {
        (Some(a), None) if !a.trim().is_empty() => Ok(()),
        (None, Some(b)) if !b.trim().is_empty() => Ok(()),
        (Some(_), Some(_)) => Err(invalid(format!(
            "{section}: set either `app` or `bundle_id`, not both"
        ))),
        _ => Err(invalid(format!("{section}: `app` or `bundle_id` is required"))),
    }
}

/// Reject entries that can never apply.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidConfig`] for the first offending entry.
pub fn check_fatal(manifest: &Manifest) -> Result<()> {
    if let Some(name) = &manifest.computer_name
        && name.trim().is_empty()
    {
        return Err(invalid("computer_name is empty"));
    }
    if let Some(zone) = &manifest.timezone
        && zone.trim().is_empty()
    {
        return Err(invalid("timezone is empty"));
    }
    if let Some(shell) = &manifest.login_shell
        && !Path::new(shell).is_absolute()
    {
        return Err(invalid(format!("login_shell must be absolute: {shell}")));
    }
    for pref in &manifest.preferences {
        if pref.domain.trim().is_empty() || pref.key.trim().is_empty() {
            return Err(invalid("preferences: domain and key are required"));
        }
        match (&pref.value, pref.delete) {
            (Some(_), true) => {
                return Err(invalid(format!(
                    "preferences: {} {} sets both `value` and `delete`",
                    pref.domain, pref.key
                )));
            }
            (None, false) => {
                return Err(invalid(format!(
                    "preferences: {} {} needs `value` or `delete = true`",
                    pref.domain, pref.key
                )));
            }
            _ => {}
        }
    }
    for entry in &manifest.notifications {
        check_target("notifications", entry.app.as_deref(), entry.bundle_id.as_deref())?;
    }
    for entry in &manifest.file_associations {
        check_target(
            "file_associations",
            entry.app.as_deref(),
            entry.bundle_id.as_deref(),
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Manifest {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn empty_computer_name_is_fatal() {
        let err = check_fatal(&parse("computer_name = \" \"")).unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: computer_name is empty");
    }

    #[test]
    fn relative_login_shell_is_fatal() {
        assert!(check_fatal(&parse("login_shell = \"bash\"")).is_err());
        assert!(check_fatal(&parse("login_shell = \"/bin/zsh\"")).is_ok());
    }

    #[test]
    fn preference_needs_exactly_one_of_value_or_delete() {
        let none = parse("[[preferences]]\ndomain = \"d\"\nkey = \"k\"");
        assert!(check_fatal(&none).is_err());
        let both = parse("[[preferences]]\ndomain = \"d\"\nkey = \"k\"\nvalue = 1\ndelete = true");
        assert!(check_fatal(&both).is_err());
        let ok = parse("[[preferences]]\ndomain = \"d\"\nkey = \"k\"\nvalue = 1");
        assert!(check_fatal(&ok).is_ok());
    }

    #[test]
    fn notification_target_must_be_unambiguous() {
        let neither = parse("[[notifications]]\nenabled = true");
        assert!(check_fatal(&neither).is_err());
        let both = parse(
            "[[notifications]]\napp = \"Slack\"\nbundle_id = \"com.tinyspeck.slackmacgap\"\nenabled = true",
        );
        assert!(check_fatal(&both).is_err());
    }

    #[test]
    fn dotted_extension_warns() {
        let m = parse(
            "[[file_associations]]\nbundle_id = \"com.sublimetext.4\"\nextensions = [\"tar.gz\", \"txt\", \" \"]",
        );
        let home = tempfile::tempdir().unwrap();
        let warnings = validate_all(&m, home.path());
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].item, "tar.gz");
    }

    #[test]
    fn missing_symlink_source_and_duplicate_target_warn() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("zshrc"), "").unwrap();
        let m = parse(
            r#"
[[symlinks]]
source = "~/zshrc"
target = "~/.zshrc"

[[symlinks]]
source = "~/missing"
target = "~/.zshrc"
"#,
        );
        let warnings = validate_all(&m, home.path());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.starts_with("source does not exist"));
        assert_eq!(warnings[1].message, "target listed more than once");
    }

    #[test]
    fn empty_package_name_warns() {
        let m = parse("[homebrew]\nformulae = [\"git\", \"\"]");
        let home = tempfile::tempdir().unwrap();
        let warnings = validate_all(&m, home.path());
        assert_eq!(warnings, vec![ValidationWarning::new("homebrew", "", "package name is empty")]);
    }

    #[test]
    fn clean_manifest_has_no_warnings() {
        let home = tempfile::tempdir().unwrap();
        assert!(validate_all(&Manifest::default(), home.path()).is_empty());
    }
}
