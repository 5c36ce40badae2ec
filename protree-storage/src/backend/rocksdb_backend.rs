/// RocksDB storage backend for protein tree indexes
///
/// Each logical table lives in its own column family so nodes, parameters and
/// protein lengths can be tuned and iterated independently.
use anyhow::{anyhow, Context, Result};
use protree_core::config::StorageConfig;
use rocksdb::{
    BlockBasedOptions, BoundColumnFamily, Cache, ColumnFamilyDescriptor, DBWithThreadMode,
    IteratorMode, MultiThreaded, Options, WriteBatch, WriteOptions, DB,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::{IndexStore, Table};

/// Column family names for the logical tables
pub mod cf_names {
    pub const DEFAULT: &str = "default";
    pub const NODES: &str = "nodes";
    pub const PARAMETERS: &str = "parameters";
    pub const LENGTHS: &str = "lengths";
}

/// RocksDB configuration options
#[derive(Debug, Clone)]
pub struct RocksDBConfig {
    /// Store directory
    pub path: PathBuf,

    /// Write buffer size in MB (default: 64)
    pub write_buffer_size_mb: usize,

    /// Maximum number of write buffers (default: 4)
    pub max_write_buffer_number: usize,

    /// Maximum background jobs (default: 4)
    pub max_background_jobs: i32,

    /// Block cache size in MB (default: 256)
    pub block_cache_size_mb: usize,

    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: f64,

    /// Compression algorithm (default: "zstd")
    pub compression: String,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("~/.protree/proteins/default"),
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 4,
            block_cache_size_mb: 256,
            bloom_filter_bits: 10.0,
            compression: "zstd".to_string(),
        }
    }
}

impl RocksDBConfig {
    /// Backend settings for a store directory from the user configuration
    pub fn from_storage_config(path: &Path, storage: &StorageConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            write_buffer_size_mb: storage.write_buffer_size_mb,
            block_cache_size_mb: storage.block_cache_size_mb,
            compression: storage.compression.clone(),
            ..Default::default()
        }
    }
}

/// RocksDB storage backend
pub struct RocksDBBackend {
    /// RocksDB instance with multi-threaded column family support
    db: Arc<DBWithThreadMode<MultiThreaded>>,

    path: PathBuf,

    existed: bool,

    /// Write options for all puts
    write_opts: WriteOptions,
}

impl RocksDBBackend {
    /// Open or create a store with default configuration
    pub fn new(path: &Path) -> Result<Self> {
        let config = RocksDBConfig {
            path: path.to_path_buf(),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Open or create a store with custom configuration
    pub fn with_config(config: RocksDBConfig) -> Result<Self> {
        let path = Self::expand_path(&config.path)?;
        let existed = Self::store_exists(&path);

        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create store directory {}", path.display()))?;

        let column_families = [
            cf_names::DEFAULT,
            cf_names::NODES,
            cf_names::PARAMETERS,
            cf_names::LENGTHS,
        ];

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = column_families
            .iter()
            .map(|name| {
                let cf_opts = Self::create_cf_options(&config, name);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db_opts = Self::create_db_options(&config);

        let db = DB::open_cf_descriptors(&db_opts, &path, cf_descriptors).map_err(|e| {
            anyhow!(
                "Failed to open RocksDB at path: {}. Error: {}",
                path.display(),
                e
            )
        })?;
        debug!("Opened store at {} (existed: {})", path.display(), existed);

        // Don't sync on every write; WAL keeps durability
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);
        write_opts.disable_wal(false);

        Ok(Self {
            db: Arc::new(db),
            path,
            existed,
            write_opts,
        })
    }

    /// Whether a RocksDB store is present at the path
    pub fn store_exists(path: &Path) -> bool {
        path.join("CURRENT").is_file()
    }

    /// Remove a closed store and its directory
    pub fn destroy(path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        DB::destroy(&Options::default(), path)
            .map_err(|e| anyhow!("Failed to destroy RocksDB at {}: {}", path.display(), e))?;
        if path.exists() {
            std::fs::remove_dir_all(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    fn create_db_options(config: &RocksDBConfig) -> Options {
        let mut opts = Options::default();

        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(1000);

        opts.set_max_background_jobs(config.max_background_jobs);
        opts.set_bytes_per_sync(1024 * 1024); // 1MB
        opts.increase_parallelism(num_cpus::get() as i32);

        opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(config.max_write_buffer_number as i32);
        opts.set_compression_type(Self::compression_type(&config.compression));

        opts
    }

    fn create_cf_options(config: &RocksDBConfig, cf_name: &str) -> Options {
        let mut opts = Options::default();

        opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(config.max_write_buffer_number as i32);

        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size_mb * 1024 * 1024);
        block_opts.set_block_cache(&cache);

        // Node lookups are point lookups by tag
        if config.bloom_filter_bits > 0.0 {
            block_opts.set_bloom_filter(config.bloom_filter_bits, false);
        }
        opts.set_block_based_table_factory(&block_opts);

        match cf_name {
            cf_names::NODES => {
                opts.set_compression_type(Self::compression_type(&config.compression));
                opts.optimize_for_point_lookup(config.block_cache_size_mb as u64);
            }
            cf_names::PARAMETERS => {
                // A handful of small scalars
                opts.set_compression_type(rocksdb::DBCompressionType::None);
            }
            _ => {
                opts.set_compression_type(Self::compression_type(&config.compression));
            }
        }

        opts
    }

    fn compression_type(name: &str) -> rocksdb::DBCompressionType {
        match name {
            "zstd" => rocksdb::DBCompressionType::Zstd,
            "lz4" => rocksdb::DBCompressionType::Lz4,
            "snappy" => rocksdb::DBCompressionType::Snappy,
            "none" => rocksdb::DBCompressionType::None,
            other => {
                warn!("Unknown compression '{}', using zstd", other);
                rocksdb::DBCompressionType::Zstd
            }
        }
    }

    /// Expand tilde in path
    fn expand_path(path: &Path) -> Result<PathBuf> {
        let path_str = path.to_str().ok_or_else(|| anyhow!("Invalid path"))?;

        if path_str.starts_with('~') {
            let home = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .context("Could not determine home directory")?;

            let expanded = path_str.replacen('~', &home, 1);
            Ok(PathBuf::from(expanded))
        } else {
            Ok(path.to_path_buf())
        }
    }

    fn cf_name(table: Table) -> &'static str {
        match table {
            Table::Nodes => cf_names::NODES,
            Table::Parameters => cf_names::PARAMETERS,
            Table::Lengths => cf_names::LENGTHS,
        }
    }

    /// Get a column family handle
    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| anyhow!("Column family '{}' not found", name))
    }
}

impl IndexStore for RocksDBBackend {
    fn put(&self, table: Table, key: &str, value: &[u8]) -> Result<()> {
        let cf = self.cf_handle(Self::cf_name(table))?;
        self.db
            .put_cf_opt(&cf, key.as_bytes(), value, &self.write_opts)
            .with_context(|| format!("Failed to write key '{}' to {}", key, table))?;
        Ok(())
    }

    fn put_batch(&self, table: Table, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let cf = self.cf_handle(Self::cf_name(table))?;
        let mut batch = WriteBatch::default();

        for (key, value) in entries {
            batch.put_cf(&cf, key.as_bytes(), value);
        }

        self.db
            .write_opt(batch, &self.write_opts)
            .with_context(|| format!("Failed to write {} entries to {}", entries.len(), table))?;
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(Self::cf_name(table))?;
        self.db
            .get_cf(&cf, key.as_bytes())
            .with_context(|| format!("Failed to read key '{}' from {}", key, table))
    }

    fn keys(&self, table: Table) -> Result<HashSet<String>> {
        let cf = self.cf_handle(Self::cf_name(table))?;
        let mut keys = HashSet::new();

        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            let (key, _value) = item?;
            let key = String::from_utf8(key.to_vec())
                .with_context(|| format!("Non UTF-8 key in {}", table))?;
            keys.insert(key);
        }

        Ok(keys)
    }

    fn flush(&self) -> Result<()> {
        for table in Table::ALL {
            let cf = self.cf_handle(Self::cf_name(table))?;
            self.db.flush_cf(&cf)?;
        }
        Ok(())
    }

    fn compact(&self) -> Result<()> {
        for table in Table::ALL {
            let cf = self.cf_handle(Self::cf_name(table))?;
            self.db
                .compact_range_cf(&cf, None::<&[u8]>, None::<&[u8]>);
        }
        Ok(())
    }

    fn existed(&self) -> bool {
        self.existed
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

impl Drop for RocksDBBackend {
    fn drop(&mut self) {
        // The database closes when the last Arc is dropped; flush pending writes first
        if let Err(e) = IndexStore::flush(self) {
            warn!("Failed to flush store at {}: {}", self.path.display(), e);
        }
    }
}
