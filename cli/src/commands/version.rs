//! Command: print version information.
use std::io::Write as _;

/// Version stamped at build time, or the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("AUTOMAC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the automac version to stdout.
pub fn run() {
    writeln!(std::io::stdout(), "automac {}", version()).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
