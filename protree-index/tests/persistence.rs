//! On-disk index lifecycle: import, reuse, rebuild and deletion

use protree_bio::{FastaProteins, SequenceProvider};
use protree_core::{Config, ProtreeError, SequenceMatchingPreferences};
use protree_index::{
    delete_store, store_dir, CancellationToken, InitiateOutcome, ProteinTree, SilentHandler, StoreLocation,
};
use protree_storage::io::metadata;
use protree_storage::RocksDBBackend;
use protree_test::assertions::{assert_mapping_contains, assert_offsets_realize};
use protree_test::{init_test_logging, sample_proteins, TestEnvironment, TestProteins};
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

fn config_for(env: &TestEnvironment) -> Config {
    let mut config = Config::default();
    config.storage.index_dir = Some(env.index_dir());
    config.tree.max_node_size = 2;
    config.import.threads = 2;
    config
}

fn open_provider(path: &Path) -> Arc<dyn SequenceProvider> {
    Arc::new(FastaProteins::open(path).unwrap())
}

fn disk_path(tree: &ProteinTree) -> PathBuf {
    match tree.store_location() {
        Some(StoreLocation::Disk(path)) => path.clone(),
        other => panic!("Expected an on-disk store, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_index_is_reused_on_reopen() {
    init_test_logging();
    let env = TestEnvironment::new().unwrap();
    let fasta = sample_proteins()
        .write_fasta(&env.fasta_dir(), "sample.fasta")
        .unwrap();
    let exact = SequenceMatchingPreferences::exact();

    let mut tree = ProteinTree::new(config_for(&env)).unwrap();
    let outcome = tree
        .initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    assert!(matches!(outcome, InitiateOutcome::Imported(_)));
    let first = tree.get_protein_mapping("TIDE", &exact).unwrap();
    let path = disk_path(&tree);
    assert!(path.starts_with(env.index_dir()));
    tree.close().unwrap();

    let mut reopened = ProteinTree::new(config_for(&env)).unwrap();
    let outcome = reopened
        .initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    assert_eq!(outcome, InitiateOutcome::Reused);
    assert_eq!(reopened.get_protein_mapping("TIDE", &exact).unwrap(), first);

    let params = reopened.parameters().unwrap();
    assert!(params.import_complete);
    assert_eq!(
        params.fasta_path.as_deref(),
        Some(fasta.to_string_lossy().as_ref())
    );
}

#[test]
#[serial]
fn test_changed_tag_size_triggers_reimport() {
    let env = TestEnvironment::new().unwrap();
    let fasta = sample_proteins()
        .write_fasta(&env.fasta_dir(), "sample.fasta")
        .unwrap();

    let mut tree = ProteinTree::new(config_for(&env)).unwrap();
    tree.initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    tree.close().unwrap();

    let mut config = config_for(&env);
    config.tree.initial_tag_size = 2;
    let mut tree = ProteinTree::new(config).unwrap();
    let outcome = tree
        .initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    assert!(matches!(outcome, InitiateOutcome::Imported(_)));
    assert_eq!(tree.parameters().unwrap().initial_tag_size, Some(2));

    let mapping = tree
        .get_protein_mapping("DE", &SequenceMatchingPreferences::exact())
        .unwrap();
    assert_mapping_contains(&mapping, "P1", 5);
    assert_mapping_contains(&mapping, "P2", 2);
}

#[test]
#[serial]
fn test_corrupted_store_is_rebuilt() {
    let env = TestEnvironment::new().unwrap();
    let fasta = sample_proteins()
        .write_fasta(&env.fasta_dir(), "sample.fasta")
        .unwrap();

    let mut tree = ProteinTree::new(config_for(&env)).unwrap();
    tree.initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    let path = disk_path(&tree);
    tree.close().unwrap();

    {
        let store = RocksDBBackend::new(&path).unwrap();
        metadata::set_corrupted(&store, true).unwrap();
    }

    let outcome = tree
        .initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    assert!(matches!(outcome, InitiateOutcome::Imported(_)));
    assert!(!tree.parameters().unwrap().corrupted);
}

/// File-backed provider whose disk loses one protein
struct UnreadableProtein {
    inner: FastaProteins,
    lost: &'static str,
    attempts: AtomicUsize,
}

impl SequenceProvider for UnreadableProtein {
    fn sequence(&self, accession: &str) -> protree_core::ProtreeResult<Arc<str>> {
        if accession == self.lost {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            return Err(std::io::Error::other("disk gone").into());
        }
        self.inner.sequence(accession)
    }

    fn accessions(&self) -> Vec<String> {
        self.inner.accessions()
    }

    fn is_default_reversed(&self) -> bool {
        self.inner.is_default_reversed()
    }

    fn source_path(&self) -> Option<&Path> {
        self.inner.source_path()
    }

    fn last_modified(&self) -> Option<SystemTime> {
        self.inner.last_modified()
    }
}

#[test]
#[serial]
fn test_import_is_retried_once_then_fails() {
    let env = TestEnvironment::new().unwrap();
    let fasta = sample_proteins()
        .write_fasta(&env.fasta_dir(), "sample.fasta")
        .unwrap();
    let provider = Arc::new(UnreadableProtein {
        inner: FastaProteins::open(&fasta).unwrap(),
        lost: "P2",
        attempts: AtomicUsize::new(0),
    });
    let mut config = config_for(&env);
    config.import.threads = 1;

    let mut tree = ProteinTree::new(config.clone()).unwrap();
    let result = tree.initiate(
        Arc::clone(&provider) as Arc<dyn SequenceProvider>,
        None,
        &SilentHandler,
    );

    match result {
        Err(ProtreeError::Corrupted(message)) => {
            assert!(message.starts_with("Import failed twice"), "{}", message);
            assert!(message.contains("disk gone"), "{}", message);
        }
        other => panic!("Expected a corrupted index error, got {:?}", other),
    }
    assert_eq!(provider.attempts.load(Ordering::SeqCst), 2);
    assert!(!tree.is_initiated());

    // The failed store is left flagged so the next open rebuilds it
    let modified = provider.last_modified().unwrap();
    let store = RocksDBBackend::new(&store_dir(&config, &fasta, modified)).unwrap();
    assert!(metadata::read_parameters(&store).unwrap().corrupted);
}

#[test]
#[serial]
fn test_cancelled_import_is_redone() {
    let env = TestEnvironment::new().unwrap();
    let fasta = TestProteins::new()
        .with_random(20, 60, 11)
        .write_fasta(&env.fasta_dir(), "random.fasta")
        .unwrap();

    let mut tree = ProteinTree::new(config_for(&env)).unwrap();
    let token = CancellationToken::cancel_after(1);
    let result = tree.initiate(open_provider(&fasta), None, &token);
    assert!(matches!(result, Err(ProtreeError::Cancelled)));
    assert!(!tree.is_initiated());

    let outcome = tree
        .initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    assert!(matches!(outcome, InitiateOutcome::Imported(_)));
    assert!(tree.parameters().unwrap().import_complete);
}

#[test]
#[serial]
fn test_gzip_database_with_decoys() {
    let env = TestEnvironment::new().unwrap();
    let proteins = sample_proteins().with_decoys();
    let fasta = proteins
        .write_fasta(&env.fasta_dir(), "sample.fasta.gz")
        .unwrap();

    let provider = open_provider(&fasta);
    assert!(provider.is_default_reversed());
    let mut tree = ProteinTree::new(config_for(&env)).unwrap();
    tree.initiate(Arc::clone(&provider), None, &SilentHandler)
        .unwrap();

    let mapping = tree
        .get_protein_mapping("EDIT", &SequenceMatchingPreferences::exact())
        .unwrap();
    assert_mapping_contains(&mapping, "P1_REVERSED", 1);
    assert_mapping_contains(&mapping, "P2_REVERSED", 4);
    assert_offsets_realize(&mapping, provider.as_ref());
    assert_eq!(tree.protein_length("P2_REVERSED").unwrap(), 8);
}

#[test]
#[serial]
fn test_delete_db_and_delete_store() {
    let env = TestEnvironment::new().unwrap();
    let fasta = sample_proteins()
        .write_fasta(&env.fasta_dir(), "sample.fasta")
        .unwrap();

    let mut tree = ProteinTree::new(config_for(&env)).unwrap();
    tree.initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    let path = disk_path(&tree);
    assert!(path.exists());
    tree.delete_db().unwrap();
    assert!(!path.exists());
    assert!(!tree.is_initiated());

    tree.initiate(open_provider(&fasta), None, &SilentHandler)
        .unwrap();
    tree.close().unwrap();
    let modified = std::fs::metadata(&fasta).unwrap().modified().unwrap();
    assert!(delete_store(&config_for(&env), &fasta, modified).unwrap());
    assert!(!path.exists());
    assert!(!delete_store(&config_for(&env), &fasta, modified).unwrap());
}
