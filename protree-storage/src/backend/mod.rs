//! Storage backend implementations

mod memory;
mod rocksdb_backend;

pub use memory::InMemoryStore;
pub use rocksdb_backend::{cf_names, RocksDBBackend, RocksDBConfig};
