//! Configuration types for protree

use crate::ProtreeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Shape of the trie and the node cache budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeConfig {
    /// Length of the seed tags indexed at the first level
    #[serde(default = "default_initial_tag_size")]
    pub initial_tag_size: usize,
    /// Accession count above which a node is split
    #[serde(default = "default_max_node_size")]
    pub max_node_size: usize,
    /// Deepest level at which a node may still be split
    #[serde(default = "default_max_peptide_size")]
    pub max_peptide_size: usize,
    /// Resident node budget, in accession-count units
    #[serde(default = "default_memory_budget")]
    pub memory_budget: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    /// Capacity of each of the fast and slow result caches
    #[serde(default = "default_query_cache_size")]
    pub query_cache_size: usize,
    #[serde(default = "default_slow_query_threshold_ms")]
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportConfig {
    /// Worker threads for the import (0 = all cores)
    #[serde(default = "default_import_threads")]
    pub threads: usize,
    #[serde(default = "default_protein_batch_size")]
    pub protein_batch_size: usize,
    /// Cleavage rule restricting seed tag start offsets ("trypsin", "lys-c", "arg-c")
    #[serde(default)]
    pub enzyme: Option<String>,
    /// Empirical share of proteins intersecting one seed tag, used to plan passes
    #[serde(default = "default_tag_coverage_percent")]
    pub tag_coverage_percent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationConfig {
    /// Accessions handed to one verification worker
    #[serde(default = "default_verification_batch_size")]
    pub batch_size: usize,
    /// Outstanding verification workers (0 = cpus - 1, at least one)
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Base directory for index stores, overrides PROTREE_INDEX_DIR
    #[serde(default)]
    pub index_dir: Option<PathBuf>,
    #[serde(default = "default_write_buffer_size_mb")]
    pub write_buffer_size_mb: usize,
    #[serde(default = "default_block_cache_size_mb")]
    pub block_cache_size_mb: usize,
    #[serde(default = "default_compression")]
    pub compression: String,
}

// Default value functions
fn default_initial_tag_size() -> usize { 3 }
fn default_max_node_size() -> usize { 500 }
fn default_max_peptide_size() -> usize { 60 }
fn default_memory_budget() -> usize { 5_000_000 }
fn default_use_cache() -> bool { true }
fn default_query_cache_size() -> usize { 100 }
fn default_slow_query_threshold_ms() -> u64 { 50 }
fn default_import_threads() -> usize { 1 }
fn default_protein_batch_size() -> usize { 100 }
fn default_tag_coverage_percent() -> usize { 6 }
fn default_verification_batch_size() -> usize { 100 }
fn default_write_buffer_size_mb() -> usize { 64 }
fn default_block_cache_size_mb() -> usize { 256 }
fn default_compression() -> String { "zstd".to_string() }

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_tag_size: default_initial_tag_size(),
            max_node_size: default_max_node_size(),
            max_peptide_size: default_max_peptide_size(),
            memory_budget: default_memory_budget(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            use_cache: default_use_cache(),
            query_cache_size: default_query_cache_size(),
            slow_query_threshold_ms: default_slow_query_threshold_ms(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            threads: default_import_threads(),
            protein_batch_size: default_protein_batch_size(),
            enzyme: None,
            tag_coverage_percent: default_tag_coverage_percent(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_verification_batch_size(),
            threads: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: None,
            write_buffer_size_mb: default_write_buffer_size_mb(),
            block_cache_size_mb: default_block_cache_size_mb(),
            compression: default_compression(),
        }
    }
}

impl ImportConfig {
    /// Resolved import thread count.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

impl VerificationConfig {
    /// Resolved bound on outstanding verification workers.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().saturating_sub(1).max(1)
        } else {
            self.threads
        }
    }
}

impl Config {
    /// Check values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ProtreeError> {
        if self.tree.initial_tag_size == 0 {
            return Err(ProtreeError::Configuration(
                "tree.initial_tag_size must be at least 1".to_string(),
            ));
        }
        if self.tree.max_node_size == 0 {
            return Err(ProtreeError::Configuration(
                "tree.max_node_size must be at least 1".to_string(),
            ));
        }
        if self.tree.memory_budget == 0 {
            return Err(ProtreeError::Configuration(
                "tree.memory_budget must be at least 1".to_string(),
            ));
        }
        if self.import.protein_batch_size == 0 || self.verification.batch_size == 0 {
            return Err(ProtreeError::Configuration(
                "batch sizes must be at least 1".to_string(),
            ));
        }
        if self.import.tag_coverage_percent == 0 || self.import.tag_coverage_percent > 100 {
            return Err(ProtreeError::Configuration(format!(
                "import.tag_coverage_percent must be within 1..=100, got {}",
                self.import.tag_coverage_percent
            )));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ProtreeError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| ProtreeError::Configuration(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), ProtreeError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| ProtreeError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.tree.initial_tag_size, 3);
        assert_eq!(config.tree.max_node_size, 500);
        assert_eq!(config.tree.max_peptide_size, 60);
        assert_eq!(config.tree.memory_budget, 5_000_000);

        assert!(config.cache.use_cache);
        assert_eq!(config.cache.query_cache_size, 100);
        assert_eq!(config.cache.slow_query_threshold_ms, 50);

        assert_eq!(config.import.threads, 1);
        assert_eq!(config.import.protein_batch_size, 100);
        assert_eq!(config.import.enzyme, None);
        assert_eq!(config.import.tag_coverage_percent, 6);

        assert_eq!(config.verification.batch_size, 100);
        assert_eq!(config.verification.threads, 0);

        assert_eq!(config.storage.index_dir, None);
        assert_eq!(config.storage.compression, "zstd");
    }

    #[test]
    fn test_default_config_function() {
        assert_eq!(Config::default(), default_config());
    }

    #[test]
    fn test_load_valid_config() {
        let toml_content = r#"
[tree]
initial_tag_size = 4
max_node_size = 200
max_peptide_size = 40
memory_budget = 1000

[cache]
use_cache = false
query_cache_size = 10
slow_query_threshold_ms = 5

[import]
threads = 4
protein_batch_size = 50
enzyme = "trypsin"
tag_coverage_percent = 10

[verification]
batch_size = 20
threads = 2

[storage]
index_dir = "/custom/path"
compression = "none"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.tree.initial_tag_size, 4);
        assert_eq!(config.tree.max_node_size, 200);
        assert_eq!(config.tree.max_peptide_size, 40);
        assert_eq!(config.tree.memory_budget, 1000);
        assert!(!config.cache.use_cache);
        assert_eq!(config.cache.query_cache_size, 10);
        assert_eq!(config.import.enzyme.as_deref(), Some("trypsin"));
        assert_eq!(config.import.effective_threads(), 4);
        assert_eq!(config.verification.effective_threads(), 2);
        assert_eq!(config.storage.index_dir, Some(PathBuf::from("/custom/path")));
        assert_eq!(config.storage.compression, "none");
        // Unspecified fields fall back to defaults
        assert_eq!(config.storage.block_cache_size_mb, 256);
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[tree]
max_node_size = 2
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.tree.max_node_size, 2);
        assert_eq!(config.tree.initial_tag_size, 3);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[tree\ninitial_tag_size = ").unwrap();

        match load_config(temp_file.path()) {
            Err(ProtreeError::Configuration(msg)) => {
                assert!(msg.contains("Failed to parse config"))
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_zero_tag_size() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[tree]\ninitial_tag_size = 0\n").unwrap();

        assert!(matches!(
            load_config(temp_file.path()),
            Err(ProtreeError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/protree/config.toml");
        assert!(matches!(result, Err(ProtreeError::Io(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = Config::default();
        config.tree.max_node_size = 42;
        config.import.enzyme = Some("lys-c".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        save_config(temp_file.path(), &config).unwrap();

        let reloaded = load_config(temp_file.path()).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_effective_threads_never_zero() {
        let verification = VerificationConfig::default();
        assert!(verification.effective_threads() >= 1);

        let import = ImportConfig {
            threads: 0,
            ..ImportConfig::default()
        };
        assert!(import.effective_threads() >= 1);
    }
}
