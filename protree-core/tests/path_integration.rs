/// Integration tests for path management
///
/// The home and index directories are cached in a OnceLock, so these tests only
/// exercise functions that do not depend on the cached environment.
use protree_core::system::paths::*;
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

#[test]
fn test_store_layout_is_keyed_by_name_and_mtime() {
    let base = Path::new("/srv/protree");
    let source = Path::new("/data/human.fasta");

    let first = store_path_in(base, source, UNIX_EPOCH + Duration::from_millis(10));
    let second = store_path_in(base, source, UNIX_EPOCH + Duration::from_millis(11));

    assert_eq!(first, PathBuf::from("/srv/protree/human.fasta_cus_10"));
    assert_ne!(first, second);
}

#[test]
fn test_store_layout_ignores_source_directory() {
    let modified = UNIX_EPOCH + Duration::from_secs(60);
    let a = store_folder_name(Path::new("/a/db.fasta"), modified);
    let b = store_folder_name(Path::new("/b/db.fasta"), modified);
    assert_eq!(a, b);
}

#[test]
#[serial]
fn test_index_dir_below_home_or_overridden() {
    let index_dir = protree_index_dir();
    if std::env::var("PROTREE_INDEX_DIR").is_err() {
        assert!(index_dir.starts_with(protree_home()));
        assert!(index_dir.ends_with("proteins"));
    }
}

#[test]
#[serial]
fn test_path_descriptions() {
    let description = describe_paths();
    assert!(description.starts_with("Protree Paths:"));
    assert!(description.contains(&protree_home().display().to_string()));
}
