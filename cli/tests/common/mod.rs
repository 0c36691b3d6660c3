// Shared helpers for integration tests.
//
// Provides a temporary home directory with a manifest file so each
// integration test can set up an isolated environment without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use automac_cli::config::Manifest;

/// An isolated home directory backed by a [`tempfile::TempDir`].
#[derive(Debug)]
pub struct TestHome {
    dir: tempfile::TempDir,
}

impl TestHome {
    /// Create an empty home directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp home"),
        }
    }

    /// Root of the home directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative` under the home, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Write `manifest.toml` and return its path.
    pub fn manifest(&self, content: &str) -> PathBuf {
        self.write("manifest.toml", content)
    }

    /// Write and load a manifest.
    pub fn load(&self, content: &str) -> Manifest {
        Manifest::load(&self.manifest(content)).expect("load manifest")
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}
