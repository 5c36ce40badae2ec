//! Persistent stores for protein tree indexes

pub mod backend;
pub mod core;
pub mod io;

// Re-export commonly used types and traits from core
pub use crate::core::{IndexStore, Table};

pub use backend::{InMemoryStore, RocksDBBackend, RocksDBConfig};

pub use io::{read_parameters, IndexParameters};
