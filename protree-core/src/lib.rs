//! Core utilities and types shared across all protree crates

pub mod config;
pub mod error;
pub mod system;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, save_config, Config};
pub use error::{ProtreeError, ProtreeResult};

pub use types::{
    MatchingMode, OutputFormat, PeptideMapping, ProteinMapping, SequenceMatchingPreferences,
};

pub use system::{
    current_version, is_compatible, parse_version, protree_home, protree_index_dir, store_path,
    INDEX_VERSION,
};

/// Version information for the protree project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
