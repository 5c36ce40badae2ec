#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use protree_test::{sample_proteins, TestProteins};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to run the protree CLI inside an isolated home
pub fn protree_cmd(env: &CliEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("protree").unwrap();
    cmd.env("PROTREE_HOME", env.temp_dir.path())
        .env_remove("PROTREE_CONFIG")
        .env_remove("RUST_LOG")
        .env("PROTREE_LOG", "warn")
        .arg("--quiet")
        .arg("--index-dir")
        .arg(env.index_dir());
    cmd
}

/// Temporary home with an input directory for FASTA files
pub struct CliEnvironment {
    pub temp_dir: TempDir,
    pub input_dir: PathBuf,
}

impl CliEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        std::fs::create_dir_all(&input_dir)?;
        Ok(Self {
            temp_dir,
            input_dir,
        })
    }

    pub fn index_dir(&self) -> PathBuf {
        self.temp_dir.path().join("proteins")
    }

    pub fn write_proteins(&self, proteins: &TestProteins, name: &str) -> Result<PathBuf> {
        proteins.write_fasta(&self.input_dir, name)
    }

    /// P1 = PEPTIDEK, P2 = TIDEKPEP
    pub fn sample_fasta(&self) -> Result<PathBuf> {
        self.write_proteins(&sample_proteins(), "sample.fasta")
    }

    pub fn create_input_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.input_dir.join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// Run `protree index` and require success
pub fn index_database(env: &CliEnvironment, fasta: &Path) {
    protree_cmd(env).arg("index").arg(fasta).assert().success();
}
