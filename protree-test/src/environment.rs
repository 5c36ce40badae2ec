//! Isolated homes for tests that touch index stores
//!
//! Each environment owns a temporary root laid out like a protree home. The process
//! environment points at it until the environment is dropped.

use anyhow::{Context, Result};
use protree_core::Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixtures::TestProteins;

const INDEX_SUBDIR: &str = "proteins";
const FASTA_SUBDIR: &str = "fasta";

/// Options for a test environment
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Keep the root directory after the test
    pub preserve: bool,
    /// Set `PROTREE_LOG=debug` while the environment lives
    pub verbose: bool,
    /// Directory name prefix, `protree-test` when unset
    pub prefix: Option<String>,
}

/// Temporary protree home.
///
/// `PROTREE_HOME` and `PROTREE_INDEX_DIR` point into the environment while it lives.
/// Path lookups in `protree-core` are cached per process, so tests that depend on them
/// should run serially and create the environment before the first lookup. Tests that
/// only need a store location should use [`TestEnvironment::config`] instead.
pub struct TestEnvironment {
    temp_dir: Option<TempDir>,
    root: PathBuf,
    /// Variables overridden by this environment with their previous values
    overridden: Vec<(&'static str, Option<OsString>)>,
    options: TestConfig,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(options: TestConfig) -> Result<Self> {
        let prefix = options.prefix.as_deref().unwrap_or("protree-test");
        let temp_dir =
            TempDir::with_prefix(prefix).context("Failed to create temporary protree home")?;
        let root = temp_dir.path().to_path_buf();
        for subdir in [INDEX_SUBDIR, FASTA_SUBDIR] {
            std::fs::create_dir_all(root.join(subdir))
                .with_context(|| format!("Failed to create {}", subdir))?;
        }

        let mut env = Self {
            temp_dir: Some(temp_dir),
            root,
            overridden: Vec::new(),
            options,
        };
        env.override_var("PROTREE_HOME", env.root.clone().into_os_string());
        env.override_var("PROTREE_INDEX_DIR", env.index_dir().into_os_string());
        if env.options.verbose {
            env.override_var("PROTREE_LOG", OsString::from("debug"));
        }
        Ok(env)
    }

    fn override_var(&mut self, key: &'static str, value: OsString) {
        self.overridden.push((key, std::env::var_os(key)));
        std::env::set_var(key, value);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding index stores
    pub fn index_dir(&self) -> PathBuf {
        self.root.join(INDEX_SUBDIR)
    }

    /// Directory for generated FASTA files
    pub fn fasta_dir(&self) -> PathBuf {
        self.root.join(FASTA_SUBDIR)
    }

    /// Default configuration with stores placed in this environment
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.index_dir = Some(self.index_dir());
        config
    }

    /// Write a protein set into the FASTA directory
    pub fn write_proteins(&self, name: &str, proteins: &TestProteins) -> Result<PathBuf> {
        proteins.write_fasta(&self.fasta_dir(), name)
    }

    pub fn write_file(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<PathBuf> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(target)
    }

    /// Keep the directory after the environment is dropped
    pub fn preserve(&mut self) {
        if let Some(temp_dir) = self.temp_dir.take() {
            eprintln!("Keeping protree test home at {}", temp_dir.keep().display());
        }
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        for (key, previous) in self.overridden.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }

        if self.options.preserve {
            self.preserve();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_proteins;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_home_layout_and_variables() {
        let env = TestEnvironment::new().unwrap();
        assert!(env.index_dir().is_dir());
        assert!(env.fasta_dir().is_dir());
        assert_eq!(
            std::env::var_os("PROTREE_INDEX_DIR"),
            Some(env.index_dir().into_os_string())
        );
        assert_eq!(env.config().storage.index_dir, Some(env.index_dir()));
    }

    #[test]
    #[serial]
    fn test_environments_do_not_share_files() {
        let first = TestEnvironment::new().unwrap();
        let second = TestEnvironment::new().unwrap();
        assert_ne!(first.root(), second.root());

        let fasta = first.write_proteins("sample.fasta", &sample_proteins()).unwrap();
        assert!(fasta.starts_with(first.fasta_dir()));
        assert!(!second.fasta_dir().join("sample.fasta").exists());
    }

    #[test]
    #[serial]
    fn test_drop_removes_root_and_restores_variables() {
        let before = std::env::var_os("PROTREE_HOME");
        let root = {
            let env = TestEnvironment::new().unwrap();
            env.write_file("nested/file.txt", b"x").unwrap();
            env.root().to_path_buf()
        };

        assert!(!root.exists());
        assert_eq!(std::env::var_os("PROTREE_HOME"), before);
    }
}
