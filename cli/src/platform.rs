//! Host platform detection.
use std::fmt;

use crate::exec::Executor;

/// Detected operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Apple macOS.
    MacOs,
    /// Anything else; provisioning commands will not exist there.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// Product version reported by `sw_vers`, e.g. `14.5`.
    pub version: Option<String>,
}

impl Platform {
    /// Detect the current platform, asking `sw_vers` for the product
    /// version on macOS.
    #[must_use]
    pub fn detect(executor: &dyn Executor) -> Self {
        let os = if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            Os::Other
        };
        let version = match os {
            Os::MacOs => Self::product_version(executor),
            Os::Other => None,
        };
        Self { os, version }
    }

    /// Create a platform with explicit values (for testing).
    #[cfg(test)]
    #[must_use]
    pub const fn new(os: Os, version: Option<String>) -> Self {
        Self { os, version }
    }

    /// Whether this is macOS.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    /// Major product version, e.g. `14` for `14.5`.
    #[must_use]
    pub fn major_version(&self) -> Option<u32> {
        self.version.as_deref()?.split('.').next()?.parse().ok()
    }

    fn product_version(executor: &dyn Executor) -> Option<String> {
        let result = executor
            .probe_unchecked("sw_vers", &["-productVersion"])
            .ok()?;
        let version = result.stdout.trim();
        (result.success && !version.is_empty()).then(|| version.to_string())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{} {v}", self.os),
            None => write!(f, "{}", self.os),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn detect_matches_build_target() {
        let mock = MockExecutor::ok("14.5");
        let p = Platform::detect(&mock);
        assert_eq!(p.is_macos(), cfg!(target_os = "macos"));
        if !p.is_macos() {
            assert_eq!(mock.call_count(), 0);
            assert!(p.version.is_none());
        }
    }

    #[test]
    fn product_version_trimmed() {
        let mock = MockExecutor::ok("14.5\n");
        assert_eq!(Platform::product_version(&mock).as_deref(), Some("14.5"));
    }

    #[test]
    fn failed_sw_vers_yields_no_version() {
        assert!(Platform::product_version(&MockExecutor::fail()).is_none());
    }

    #[test]
    fn major_version_parsed() {
        let p = Platform::new(Os::MacOs, Some("13.6.1".to_string()));
        assert_eq!(p.major_version(), Some(13));
        assert_eq!(Platform::new(Os::Other, None).major_version(), None);
    }

    #[test]
    fn display_includes_version() {
        let p = Platform::new(Os::MacOs, Some("14.5".to_string()));
        assert_eq!(p.to_string(), "macos 14.5");
        assert_eq!(Os::Other.to_string(), "other");
    }
}
