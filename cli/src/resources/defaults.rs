//! `defaults` preference-domain resources.
use anyhow::{Context as _, Result};

use super::value::{self, PrefValue, Scalar};
use super::{Applicable, Resource, ResourceChange, ResourceState, converge};
use crate::exec::Executor;

const DEFAULTS: &str = "defaults";
const CURRENT_HOST: &str = "-currentHost";

/// Build `defaults [-currentHost] <verb> <rest...>`.
fn defaults_args<'s>(current_host: bool, verb: &'s str, rest: &[&'s str]) -> Vec<&'s str> {
    let mut args = Vec::with_capacity(rest.len() + 2);
    if current_host {
        args.push(CURRENT_HOST);
    }
    args.push(verb);
    args.extend_from_slice(rest);
    args
}

/// Read the raw value of `domain`/`key`, or `None` when the key is absent.
///
/// # Errors
///
/// Returns an error only if `defaults` cannot be spawned.
pub fn read_raw(
    executor: &dyn Executor,
    domain: &str,
    key: &str,
    current_host: bool,
) -> Result<Option<String>> {
    let args = defaults_args(current_host, "read", &[domain, key]);
    let result = executor.probe_unchecked(DEFAULTS, &args)?;
    Ok(result.success.then_some(result.stdout))
}

/// A scalar preference written with an explicit type tag.
#[derive(Debug)]
pub struct DefaultsWrite<'a> {
    domain: String,
    key: String,
    value: Scalar,
    current_host: bool,
    privileged: bool,
    executor: &'a dyn Executor,
}

impl<'a> DefaultsWrite<'a> {
    /// Create a per-user write of `value` to `domain`/`key`.
    #[must_use]
    pub fn new(domain: &str, key: &str, value: Scalar, executor: &'a dyn Executor) -> Self {
        Self {
            domain: domain.to_string(),
            key: key.to_string(),
            value,
            current_host: false,
            privileged: false,
            executor,
        }
    }

    /// Scope the read and write to the current host (`-currentHost`).
    #[must_use]
    pub const fn current_host(mut self, on: bool) -> Self {
        self.current_host = on;
        self
    }

    /// Issue the write with elevated privileges.
    #[must_use]
    pub const fn privileged(mut self, on: bool) -> Self {
        self.privileged = on;
        self
    }
}

impl Applicable for DefaultsWrite<'_> {
    fn description(&self) -> String {
        format!("{} {} = {}", self.domain, self.key, self.value)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let literal = self.value.literal();
        let args = defaults_args(
            self.current_host,
            "write",
            &[&self.domain, &self.key, self.value.type_tag(), &literal],
        );
        if self.privileged {
            self.executor.sudo(DEFAULTS, &args, true)?;
        } else {
            self.executor.run(DEFAULTS, &args)?;
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DefaultsWrite<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        match read_raw(self.executor, &self.domain, &self.key, self.current_host)? {
            None => Ok(ResourceState::Missing),
            Some(current) if current == self.value.canonical() => Ok(ResourceState::Correct),
            Some(current) => Ok(ResourceState::Incorrect { current }),
        }
    }
}

/// A list or mapping written as an inline property-list fragment.
#[derive(Debug)]
pub struct DefaultsWriteStructured<'a> {
    domain: String,
    key: String,
    value: PrefValue,
    executor: &'a dyn Executor,
}

impl<'a> DefaultsWriteStructured<'a> {
    /// Create a structured write of `value` to `domain`/`key`.
    #[must_use]
    pub fn new(domain: &str, key: &str, value: PrefValue, executor: &'a dyn Executor) -> Self {
        Self {
            domain: domain.to_string(),
            key: key.to_string(),
            value,
            executor,
        }
    }
}

impl Applicable for DefaultsWriteStructured<'_> {
    fn description(&self) -> String {
        format!("{} {} = {}", self.domain, self.key, self.value)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let fragment = value::to_fragment(&self.value.to_plist())
            .with_context(|| format!("encoding {} {}", self.domain, self.key))?;
        self.executor
            .run(DEFAULTS, &["write", &self.domain, &self.key, &fragment])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DefaultsWriteStructured<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let exported = self
            .executor
            .probe(DEFAULTS, &["export", &self.domain, "-"])?;
        let document = value::parse_document(&exported.stdout)
            .with_context(|| format!("reading domain {}", self.domain))?;
        let current = document
            .as_dictionary()
            .and_then(|dict| dict.get(&self.key));
        match current {
            None => Ok(ResourceState::Missing),
            Some(current) if *current == self.value.to_plist() => Ok(ResourceState::Correct),
            Some(current) => Ok(ResourceState::Incorrect {
                current: value::to_fragment(current).unwrap_or_default(),
            }),
        }
    }
}

/// Removal of `domain`/`key`; already correct when the key is absent.
#[derive(Debug)]
pub struct DefaultsDelete<'a> {
    domain: String,
    key: String,
    executor: &'a dyn Executor,
}

impl<'a> DefaultsDelete<'a> {
    /// Create a delete of `domain`/`key`.
    #[must_use]
    pub fn new(domain: &str, key: &str, executor: &'a dyn Executor) -> Self {
        Self {
            domain: domain.to_string(),
            key: key.to_string(),
            executor,
        }
    }
}

impl Applicable for DefaultsDelete<'_> {
    fn description(&self) -> String {
        format!("{} {} (delete)", self.domain, self.key)
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor
            .run(DEFAULTS, &["delete", &self.domain, &self.key])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DefaultsDelete<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(read_raw(self.executor, &self.domain, &self.key, false)?
            .map_or(ResourceState::Correct, |current| ResourceState::Incorrect {
                current,
            }))
    }
}

/// Facade over the `defaults` resources.
#[derive(Debug, Clone, Copy)]
pub struct KeyValueStore<'a> {
    executor: &'a dyn Executor,
}

impl<'a> KeyValueStore<'a> {
    /// Create a store backed by `executor`.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    /// Best-effort read; empty when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error only if `defaults` cannot be spawned.
    pub fn read(&self, domain: &str, key: &str) -> Result<String> {
        Ok(read_raw(self.executor, domain, key, false)?.unwrap_or_default())
    }

    /// Write a scalar unless the stored value already matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the write command fails.
    pub fn write(
        &self,
        domain: &str,
        key: &str,
        value: Scalar,
        current_host: bool,
        privileged: bool,
    ) -> Result<ResourceChange> {
        converge(
            &DefaultsWrite::new(domain, key, value, self.executor)
                .current_host(current_host)
                .privileged(privileged),
        )
    }

    /// Write a list or mapping unless the stored value is structurally equal.
    ///
    /// # Errors
    ///
    /// Returns an error if exporting the domain or the write command fails.
    pub fn write_structured(
        &self,
        domain: &str,
        key: &str,
        value: PrefValue,
    ) -> Result<ResourceChange> {
        converge(&DefaultsWriteStructured::new(
            domain,
            key,
            value,
            self.executor,
        ))
    }

    /// Write any [`PrefValue`], dispatching on its shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    pub fn write_value(
        &self,
        domain: &str,
        key: &str,
        value: &PrefValue,
        current_host: bool,
        privileged: bool,
    ) -> Result<ResourceChange> {
        match value.as_scalar() {
            Some(scalar) => self.write(domain, key, scalar, current_host, privileged),
            None => self.write_structured(domain, key, value.clone()),
        }
    }

    /// Delete a key if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete command fails.
    pub fn delete(&self, domain: &str, key: &str) -> Result<ResourceChange> {
        converge(&DefaultsDelete::new(domain, key, self.executor))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use std::collections::BTreeMap;

    const EXPORT_EMPTY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict/>\n</plist>";

    fn export_with_date_format() -> String {
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict>\n\t<key>AppleICUDateFormatStrings</key>\n\t<dict>\n\t\t<key>1</key>\n\t\t<string>y-MM-dd</string>\n\t</dict>\n</dict>\n</plist>".to_string()
    }

    fn date_format() -> PrefValue {
        PrefValue::Map(BTreeMap::from([(
            "1".to_string(),
            PrefValue::String("y-MM-dd".to_string()),
        )]))
    }

    #[test]
    fn write_skips_when_value_matches() {
        let mock = MockExecutor::ok("1");
        let store = KeyValueStore::new(&mock);
        let change = store
            .write("com.apple.dock", "autohide", true.into(), false, false)
            .unwrap();
        assert_eq!(change, ResourceChange::AlreadyCorrect);
        assert_eq!(mock.mutation_count(), 0);
        assert_eq!(mock.probe_count(), 1);
    }

    #[test]
    fn write_issues_typed_write_on_divergence() {
        let mock = MockExecutor::script(&[(true, "0"), (true, "")]);
        let store = KeyValueStore::new(&mock);
        let change = store
            .write("com.apple.dock", "autohide", true.into(), false, false)
            .unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(
            mock.commands(),
            vec![
                "defaults read com.apple.dock autohide",
                "defaults write com.apple.dock autohide -bool true",
            ]
        );
    }

    #[test]
    fn write_when_key_absent() {
        let mock = MockExecutor::script(&[(false, ""), (true, "")]);
        let store = KeyValueStore::new(&mock);
        store
            .write("com.apple.dock", "tilesize", Scalar::Integer(36), false, false)
            .unwrap();
        assert_eq!(
            mock.commands()[1],
            "defaults write com.apple.dock tilesize -int 36"
        );
    }

    #[test]
    fn write_twice_mutates_once() {
        let mock = MockExecutor::script(&[(true, "bottom"), (true, ""), (true, "left")]);
        let store = KeyValueStore::new(&mock);
        store
            .write("com.apple.dock", "orientation", "left".into(), false, false)
            .unwrap();
        let second = store
            .write("com.apple.dock", "orientation", "left".into(), false, false)
            .unwrap();
        assert_eq!(second, ResourceChange::AlreadyCorrect);
        assert_eq!(mock.mutation_count(), 1);
    }

    #[test]
    fn current_host_flag_precedes_verb() {
        let mock = MockExecutor::script(&[(true, "5"), (true, "")]);
        let store = KeyValueStore::new(&mock);
        store
            .write("com.apple.screensaver", "idleTime", Scalar::Integer(0), true, false)
            .unwrap();
        assert_eq!(
            mock.commands(),
            vec![
                "defaults -currentHost read com.apple.screensaver idleTime",
                "defaults -currentHost write com.apple.screensaver idleTime -int 0",
            ]
        );
    }

    #[test]
    fn privileged_write_uses_sudo() {
        let mock = MockExecutor::script(&[(false, ""), (true, "")]);
        let store = KeyValueStore::new(&mock);
        store
            .write(
                "/Library/Preferences/SystemConfiguration/com.apple.smb.server",
                "NetBIOSName",
                "mac".into(),
                false,
                true,
            )
            .unwrap();
        assert_eq!(
            mock.commands()[1],
            "sudo -S -- defaults write /Library/Preferences/SystemConfiguration/com.apple.smb.server NetBIOSName -string mac"
        );
    }

    #[test]
    fn failed_write_aborts() {
        let mock = MockExecutor::script(&[(false, ""), (false, "")]);
        let store = KeyValueStore::new(&mock);
        let err = store
            .write("com.apple.dock", "autohide", true.into(), false, false)
            .unwrap_err();
        assert!(err.to_string().contains("Shell command failed"), "{err}");
    }

    #[test]
    fn read_returns_empty_when_absent() {
        let mock = MockExecutor::fail();
        assert_eq!(
            KeyValueStore::new(&mock).read("com.apple.dock", "x").unwrap(),
            ""
        );
    }

    #[test]
    fn structured_write_when_key_missing() {
        let mock = MockExecutor::script(&[(true, EXPORT_EMPTY), (true, "")]);
        let store = KeyValueStore::new(&mock);
        let change = store
            .write_structured(
                "NSGlobalDomain",
                "AppleICUDateFormatStrings",
                date_format(),
            )
            .unwrap();
        assert_eq!(change, ResourceChange::Applied);
        let calls = mock.calls();
        assert_eq!(
            calls[1].argv,
            vec![
                "defaults",
                "write",
                "NSGlobalDomain",
                "AppleICUDateFormatStrings",
                "<dict><key>1</key><string>y-MM-dd</string></dict>",
            ]
        );
    }

    #[test]
    fn structured_write_skips_equal_value() {
        let mock = MockExecutor::with_responses(vec![(true, export_with_date_format())]);
        let store = KeyValueStore::new(&mock);
        let change = store
            .write_structured(
                "NSGlobalDomain",
                "AppleICUDateFormatStrings",
                date_format(),
            )
            .unwrap();
        assert_eq!(change, ResourceChange::AlreadyCorrect);
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn structured_export_failure_aborts() {
        let mock = MockExecutor::fail();
        let err = KeyValueStore::new(&mock)
            .write_structured("NSGlobalDomain", "k", date_format())
            .unwrap_err();
        assert!(err.to_string().contains("defaults export NSGlobalDomain -"));
    }

    #[test]
    fn write_value_dispatches_on_shape() {
        let mock = MockExecutor::script(&[(true, "1")]);
        KeyValueStore::new(&mock)
            .write_value(
                "com.apple.dock",
                "autohide",
                &PrefValue::Boolean(true),
                false,
                false,
            )
            .unwrap();
        assert_eq!(mock.commands(), vec!["defaults read com.apple.dock autohide"]);
    }

    #[test]
    fn delete_present_key() {
        let mock = MockExecutor::script(&[(true, "1"), (true, "")]);
        let change = KeyValueStore::new(&mock)
            .delete("com.apple.dock", "persistent-apps")
            .unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(
            mock.commands()[1],
            "defaults delete com.apple.dock persistent-apps"
        );
    }

    #[test]
    fn delete_absent_key_is_noop() {
        let mock = MockExecutor::fail();
        let change = KeyValueStore::new(&mock)
            .delete("com.apple.dock", "persistent-apps")
            .unwrap();
        assert_eq!(change, ResourceChange::AlreadyCorrect);
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn delete_twice_mutates_once() {
        let mock = MockExecutor::script(&[(true, "1"), (true, ""), (false, "")]);
        let store = KeyValueStore::new(&mock);
        assert_eq!(
            store.delete("com.apple.dock", "persistent-apps").unwrap(),
            ResourceChange::Applied
        );
        assert_eq!(
            store.delete("com.apple.dock", "persistent-apps").unwrap(),
            ResourceChange::AlreadyCorrect
        );
        assert_eq!(mock.mutation_count(), 1);
        assert_eq!(mock.remaining(), 0);
    }

    #[test]
    fn description_shows_value() {
        let mock = MockExecutor::default();
        let r = DefaultsWrite::new("com.apple.dock", "autohide", true.into(), &mock);
        assert_eq!(r.description(), "com.apple.dock autohide = true");
    }
}
