use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

// Cache the paths to avoid repeated environment lookups
static PROTREE_HOME: OnceLock<PathBuf> = OnceLock::new();
static PROTREE_INDEX_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the protree home directory
/// Checks PROTREE_HOME environment variable, falls back to ${HOME}/.protree
pub fn protree_home() -> PathBuf {
    PROTREE_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("PROTREE_HOME") {
                PathBuf::from(path)
            } else {
                let home = std::env::var("HOME").unwrap_or_else(|_| {
                    std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
                });
                PathBuf::from(home).join(".protree")
            }
        })
        .clone()
}

/// Get the directory holding one index store per protein database
/// Checks PROTREE_INDEX_DIR environment variable, falls back to PROTREE_HOME/proteins
pub fn protree_index_dir() -> PathBuf {
    PROTREE_INDEX_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("PROTREE_INDEX_DIR") {
                PathBuf::from(path)
            } else {
                protree_home().join("proteins")
            }
        })
        .clone()
}

/// Default location of the configuration file
pub fn config_path() -> PathBuf {
    protree_home().join("config.toml")
}

/// Folder name of the store for a source file: `{file name}_cus_{last modified millis}`.
///
/// A source file that changes on disk maps to a new folder, so a stale index is never reused.
pub fn store_folder_name(source: &Path, last_modified: SystemTime) -> String {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proteins".to_string());
    let millis = last_modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}_cus_{}", file_name, millis)
}

/// Store directory for a source file below the given base directory
pub fn store_path_in(base: &Path, source: &Path, last_modified: SystemTime) -> PathBuf {
    base.join(store_folder_name(source, last_modified))
}

/// Store directory for a source file below the default index directory
pub fn store_path(source: &Path, last_modified: SystemTime) -> PathBuf {
    store_path_in(&protree_index_dir(), source, last_modified)
}

/// Check if running in a custom data directory
pub fn is_custom_data_dir() -> bool {
    std::env::var("PROTREE_HOME").is_ok() || std::env::var("PROTREE_INDEX_DIR").is_ok()
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths() -> String {
    format!(
        "Protree Paths:\n  \
        Home: {}\n  \
        Indexes: {}\n  \
        Config: {}\n  \
        Custom: {}",
        protree_home().display(),
        protree_index_dir().display(),
        config_path().display(),
        if is_custom_data_dir() {
            "Yes"
        } else {
            "No (using defaults)"
        }
    )
}
