#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for manifest loading and validation.

mod common;

use automac_cli::config::Manifest;
use automac_cli::error::ProvisionError;
use automac_cli::resources::file_assoc::Role;
use automac_cli::resources::value::PrefValue;
use common::TestHome;

const FULL: &str = r#"
lookup_dirs = ["~/dotfiles/lists"]
computer_name = "studio"
timezone = "Europe/Berlin"
login_shell = "/opt/homebrew/bin/bash"
directories = ["~/Projects", "~/Screenshots"]
quarantine = ["Firefox"]
manual_steps = ["Start Dropbox and sync, then re-run"]

[homebrew]
bootstrap = true
analytics_off = true
formulae = ["git", "duti"]
formula_lists = ["formulae.txt"]
casks = ["firefox"]

[[symlinks]]
source = "~/dotfiles/zshrc"
target = "~/.zshrc"

[[preferences]]
domain = "com.apple.dock"
key = "persistent-apps"
value = []

[[preferences]]
domain = "com.apple.screencapture"
key = "location"
value = "~/Screenshots"

[[preferences]]
domain = "com.apple.dock"
key = "orientation"
delete = true

[[notifications]]
bundle_id = "com.tinyspeck.slackmacgap"
path = "/Applications/Slack.app"
enabled = false

[[file_associations]]
bundle_id = "com.sublimetext.4"
extensions = ["txt", ".md"]
role = "editor"
"#;

#[test]
fn full_manifest_loads_and_validates() {
    let home = TestHome::new();
    home.write("dotfiles/zshrc", "");
    let manifest = home.load(FULL);

    assert_eq!(manifest.timezone.as_deref(), Some("Europe/Berlin"));
    assert_eq!(manifest.preferences.len(), 3);
    assert_eq!(manifest.preferences[0].value, Some(PrefValue::List(vec![])));
    assert!(manifest.preferences[2].delete);
    assert_eq!(manifest.file_associations[0].role, Role::Editor);
    assert_eq!(
        manifest.notifications[0].path.as_deref(),
        Some("/Applications/Slack.app")
    );
    assert!(manifest.validate(home.path()).unwrap().is_empty());
}

#[test]
fn unknown_key_is_rejected() {
    let home = TestHome::new();
    let path = home.manifest("hostname = \"studio\"");
    let err = Manifest::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("hostname"));
}

#[test]
fn unknown_role_is_rejected() {
    let home = TestHome::new();
    let path = home.manifest(
        "[[file_associations]]\nbundle_id = \"com.sublimetext.4\"\nextensions = [\"txt\"]\nrole = \"owner\"",
    );
    assert!(Manifest::load(&path).is_err());
}

#[test]
fn missing_manifest_is_missing_file() {
    let home = TestHome::new();
    let err = Manifest::load(&home.path().join("absent.toml")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::MissingFile(_))
    ));
}

#[test]
fn list_file_resolved_from_lookup_dirs() {
    let home = TestHome::new();
    let list = home.write("dotfiles/lists/formulae.txt", "git\n");
    let manifest = home.load(FULL);
    assert_eq!(
        manifest.resolve_list_file("formulae.txt", home.path()).unwrap(),
        list
    );
}

#[test]
fn notification_without_target_is_fatal() {
    let home = TestHome::new();
    let manifest = home.load("[[notifications]]\nenabled = true");
    let err = manifest.validate(home.path()).unwrap_err();
    assert!(err.to_string().starts_with("invalid configuration"));
}
