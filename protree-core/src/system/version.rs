//! Version management for index stores

use crate::ProtreeError;
use semver::Version;

/// Schema version written into every store's parameters table
pub const INDEX_VERSION: &str = "1.1.2";

/// Parse and validate a version string
pub fn parse_version(version_str: &str) -> Result<Version, ProtreeError> {
    Version::parse(version_str)
        .map_err(|e| ProtreeError::Version(format!("Invalid version format: {}", e)))
}

/// Check if two versions are compatible
/// Versions are compatible if they have the same major version
pub fn is_compatible(v1: &Version, v2: &Version) -> bool {
    v1.major == v2.major
}

/// Get the current version of protree
pub fn current_version() -> Result<Version, ProtreeError> {
    parse_version(crate::VERSION)
}

/// Whether a store stamped with `stored` can be served by this build.
///
/// The stamp has to match exactly; anything else forces a rebuild.
pub fn is_index_version_current(stored: &str) -> bool {
    match (parse_version(stored), parse_version(INDEX_VERSION)) {
        (Ok(stored), Ok(current)) => stored == current,
        _ => false,
    }
}
