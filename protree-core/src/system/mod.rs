pub mod paths;
pub mod version;

// Re-export commonly used functions
pub use paths::{
    config_path, describe_paths, is_custom_data_dir, protree_home, protree_index_dir,
    store_folder_name, store_path, store_path_in,
};
pub use version::{
    current_version, is_compatible, is_index_version_current, parse_version, INDEX_VERSION,
};
