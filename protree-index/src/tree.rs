//! The protein tree handle
//!
//! A `ProteinTree` owns one index: the store it was imported into, the provider the
//! sequences come from, and the node and result caches in front of them. It is created
//! from a configuration, bound to a database by [`ProteinTree::initiate`], and then
//! answers queries from any thread.

use parking_lot::RwLock;
use protree_bio::sequence::{is_decoy_accession, reverse_sequence, target_accession};
use protree_bio::{CleavageRule, SequenceProvider};
use protree_core::system::{is_index_version_current, protree_index_dir, store_path_in};
use protree_core::types::mapping::merge_peptide_mappings;
use protree_core::{
    Config, PeptideMapping, ProtreeError, ProtreeResult, SequenceMatchingPreferences,
};
use protree_storage::io::metadata;
use protree_storage::{
    read_parameters, IndexParameters, IndexStore, InMemoryStore, RocksDBBackend, RocksDBConfig,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

use crate::builder::{ImportSettings, ImportSummary, TreeBuilder};
use crate::cache::NodeCache;
use crate::iter::PeptideIterator;
use crate::decoy::reverse_mapping;
use crate::progress::WaitingHandler;
use crate::query::Traversal;
use crate::result_cache::{QueryCache, QueryCacheStats};
use crate::verify::VerificationPool;

/// Where the store of an index lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Disk(PathBuf),
    /// Throwaway store, rebuilt on every initiation
    Memory,
}

impl StoreLocation {
    fn open(&self, config: &Config) -> ProtreeResult<Box<dyn IndexStore>> {
        match self {
            StoreLocation::Disk(path) => {
                let rocks_config = RocksDBConfig::from_storage_config(path, &config.storage);
                Ok(Box::new(RocksDBBackend::with_config(rocks_config)?))
            }
            StoreLocation::Memory => Ok(Box::new(InMemoryStore::new())),
        }
    }

    /// Remove the store. It must be closed.
    fn destroy(&self) -> ProtreeResult<()> {
        if let StoreLocation::Disk(path) = self {
            RocksDBBackend::destroy(path)?;
        }
        Ok(())
    }
}

/// How `initiate` obtained a usable index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiateOutcome {
    /// A complete, current index was already present
    Reused,
    Imported(ImportSummary),
}

struct OpenIndex {
    store: Box<dyn IndexStore>,
    provider: Arc<dyn SequenceProvider>,
    location: StoreLocation,
    tag_size: usize,
    default_reversed: bool,
}

pub struct ProteinTree {
    config: Config,
    index: Option<OpenIndex>,
    nodes: NodeCache,
    results: QueryCache,
    verifier: VerificationPool,
    lengths: RwLock<HashMap<String, usize>>,
}

impl ProteinTree {
    /// Create an unbound tree. The configuration is validated here.
    pub fn new(config: Config) -> ProtreeResult<Self> {
        config.validate()?;
        let capacity = if config.cache.use_cache {
            config.cache.query_cache_size
        } else {
            0
        };
        Ok(Self {
            nodes: NodeCache::new(config.tree.memory_budget),
            results: QueryCache::new(
                capacity,
                Duration::from_millis(config.cache.slow_query_threshold_ms),
            ),
            verifier: VerificationPool::new(
                config.verification.batch_size,
                config.verification.effective_threads(),
            ),
            lengths: RwLock::new(HashMap::new()),
            index: None,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Store location for a provider: one directory per source file and modification
    /// time, or a memory store when the provider has no backing file.
    pub fn location_for(&self, provider: &dyn SequenceProvider) -> StoreLocation {
        match (provider.source_path(), provider.last_modified()) {
            (Some(source), Some(modified)) => {
                StoreLocation::Disk(store_dir(&self.config, source, modified))
            }
            _ => StoreLocation::Memory,
        }
    }

    /// Bind the tree to a database, reusing a valid stored index or importing one.
    pub fn initiate(
        &mut self,
        provider: Arc<dyn SequenceProvider>,
        enzyme: Option<&dyn CleavageRule>,
        handler: &dyn WaitingHandler,
    ) -> ProtreeResult<InitiateOutcome> {
        let location = self.location_for(provider.as_ref());
        self.initiate_at(location, provider, enzyme, handler)
    }

    /// [`initiate`](Self::initiate) with an explicit store location.
    ///
    /// A failed import marks the store corrupted, deletes it and is retried once with a
    /// fresh store. Cancellation is returned as is and leaves the store incomplete.
    pub fn initiate_at(
        &mut self,
        location: StoreLocation,
        provider: Arc<dyn SequenceProvider>,
        enzyme: Option<&dyn CleavageRule>,
        handler: &dyn WaitingHandler,
    ) -> ProtreeResult<InitiateOutcome> {
        self.close()?;

        let first = self.open_or_import(&location, &provider, enzyme, handler);
        let (index, outcome) = match first {
            Ok(opened) => opened,
            Err(ProtreeError::Cancelled) => return Err(ProtreeError::Cancelled),
            Err(e) => {
                warn!("Index at {:?} unusable ({}), rebuilding from scratch", location, e);
                location.destroy()?;
                self.open_or_import(&location, &provider, enzyme, handler)
                    .map_err(|e| match e {
                        ProtreeError::Cancelled => e,
                        other => {
                            error!("Second import attempt failed: {}", other);
                            ProtreeError::Corrupted(format!("Import failed twice: {}", other))
                        }
                    })?
            }
        };

        self.index = Some(index);
        Ok(outcome)
    }

    fn open_or_import(
        &self,
        location: &StoreLocation,
        provider: &Arc<dyn SequenceProvider>,
        enzyme: Option<&dyn CleavageRule>,
        handler: &dyn WaitingHandler,
    ) -> ProtreeResult<(OpenIndex, InitiateOutcome)> {
        let tag_size = self.config.tree.initial_tag_size;
        let mut store = location.open(&self.config)?;

        if store.existed() {
            match self.validate(store.as_ref(), provider.as_ref()) {
                Ok(()) => {
                    info!("Reusing index at {:?}", location);
                    let index = self.open_index(store, provider, location, tag_size);
                    return Ok((index, InitiateOutcome::Reused));
                }
                Err(reason) => {
                    warn!("Rebuilding index at {:?}: {}", location, reason);
                    drop(store);
                    location.destroy()?;
                    store = location.open(&self.config)?;
                }
            }
        }

        let settings = ImportSettings::from_config(&self.config);
        let built = TreeBuilder::new(provider.as_ref(), store.as_ref(), settings, handler)
            .with_enzyme(enzyme)
            .build();

        match built {
            Ok(summary) => {
                let index = self.open_index(store, provider, location, tag_size);
                Ok((index, InitiateOutcome::Imported(summary)))
            }
            Err(ProtreeError::Cancelled) => {
                info!("Import cancelled, index left incomplete");
                Err(ProtreeError::Cancelled)
            }
            Err(e) => {
                if let Err(flag_error) = metadata::set_corrupted(store.as_ref(), true) {
                    warn!("Could not flag store as corrupted: {:#}", flag_error);
                }
                Err(e)
            }
        }
    }

    /// Check stored parameters against the requested ones.
    fn validate(&self, store: &dyn IndexStore, provider: &dyn SequenceProvider) -> ProtreeResult<()> {
        let params: IndexParameters = read_parameters(store)?;
        if params.corrupted {
            return Err(ProtreeError::Corrupted("store flagged as corrupted".to_string()));
        }
        if !params.import_complete {
            return Err(ProtreeError::StaleIndex("import was not completed".to_string()));
        }
        match params.version.as_deref() {
            Some(version) if is_index_version_current(version) => {}
            other => {
                return Err(ProtreeError::StaleIndex(format!(
                    "index version {:?} is not current",
                    other
                )))
            }
        }
        let tag_size = self.config.tree.initial_tag_size;
        if params.initial_tag_size != Some(tag_size) {
            return Err(ProtreeError::StaleIndex(format!(
                "seed tag length {:?} differs from requested {}",
                params.initial_tag_size, tag_size
            )));
        }
        if let Some(source) = provider.source_path() {
            let source = source.to_string_lossy();
            if params.fasta_path.as_deref() != Some(source.as_ref()) {
                return Err(ProtreeError::StaleIndex(format!(
                    "index was built from {:?}",
                    params.fasta_path
                )));
            }
        }
        Ok(())
    }

    fn open_index(
        &self,
        store: Box<dyn IndexStore>,
        provider: &Arc<dyn SequenceProvider>,
        location: &StoreLocation,
        tag_size: usize,
    ) -> OpenIndex {
        self.empty_cache();
        self.lengths.write().clear();
        OpenIndex {
            store,
            default_reversed: provider.is_default_reversed(),
            provider: Arc::clone(provider),
            location: location.clone(),
            tag_size,
        }
    }

    fn index(&self) -> ProtreeResult<&OpenIndex> {
        self.index.as_ref().ok_or_else(|| {
            ProtreeError::InvalidInput("Protein tree has not been initiated".to_string())
        })
    }

    pub fn is_initiated(&self) -> bool {
        self.index.is_some()
    }

    /// Stored parameters of the bound index
    pub fn parameters(&self) -> ProtreeResult<IndexParameters> {
        Ok(read_parameters(self.index()?.store.as_ref())?)
    }

    pub fn store_location(&self) -> Option<&StoreLocation> {
        self.index.as_ref().map(|index| &index.location)
    }

    /// Every protein and offset where `peptide` is realized under `preferences`, keyed
    /// by the realized sequence. Decoys of a target/decoy database are included.
    pub fn get_protein_mapping(
        &self,
        peptide: &str,
        preferences: &SequenceMatchingPreferences,
    ) -> ProtreeResult<PeptideMapping> {
        let index = self.index()?;
        let peptide = normalize_peptide(peptide)?;
        if peptide.len() < index.tag_size {
            return Err(ProtreeError::PeptideTooShort {
                peptide,
                min_length: index.tag_size,
            });
        }

        let caching = self.results.capacity() > 0;
        if caching {
            if self.results.ensure_preferences(preferences) {
                debug!("Matching preferences changed, query caches emptied");
            }
            if let Some(cached) = self.results.get(&peptide) {
                return Ok((*cached).clone());
            }
            if index.default_reversed {
                if let Some(cached) = self.results.peek(&reverse_sequence(&peptide)) {
                    return reverse_mapping(&cached, |a| self.stored_length(index, a));
                }
            }
        }

        let started = Instant::now();
        let traversal = self.traversal(index);
        let mut mapping = traversal.peptide_mapping(&peptide, preferences)?;
        if index.default_reversed {
            let reversed = traversal.peptide_mapping(&reverse_sequence(&peptide), preferences)?;
            let decoys = reverse_mapping(&reversed, |a| self.stored_length(index, a))?;
            merge_peptide_mappings(&mut mapping, decoys);
        }

        if caching {
            self.results
                .insert(peptide, Arc::new(mapping.clone()), started.elapsed());
        }
        Ok(mapping)
    }

    /// Realized sequences of `peptide` in one protein, with their offsets.
    pub fn get_matched_peptide_sequences(
        &self,
        peptide: &str,
        accession: &str,
        preferences: &SequenceMatchingPreferences,
    ) -> ProtreeResult<HashMap<String, Vec<usize>>> {
        let mapping = self.get_protein_mapping(peptide, preferences)?;
        Ok(mapping
            .into_iter()
            .filter_map(|(sequence, mut proteins)| {
                proteins.remove(accession).map(|positions| (sequence, positions))
            })
            .collect())
    }

    /// Every branch end of the tree with the proteins and offsets stored there, in
    /// alphabetical order of the tag. Decoys of a target/decoy database are not indexed
    /// and do not appear.
    pub fn peptides(&self) -> ProtreeResult<PeptideIterator<'_>> {
        let index = self.index()?;
        Ok(PeptideIterator::new(
            index.store.as_ref(),
            &self.nodes,
            index.tag_size,
        ))
    }

    fn traversal<'a>(&'a self, index: &'a OpenIndex) -> Traversal<'a> {
        Traversal {
            store: index.store.as_ref(),
            provider: index.provider.as_ref(),
            nodes: &self.nodes,
            verifier: &self.verifier,
            tag_size: index.tag_size,
        }
    }

    fn stored_length(&self, index: &OpenIndex, accession: &str) -> ProtreeResult<Option<usize>> {
        if let Some(&length) = self.lengths.read().get(accession) {
            return Ok(Some(length));
        }
        let length = metadata::get_protein_length(index.store.as_ref(), accession)?;
        if let Some(length) = length {
            self.lengths.write().insert(accession.to_string(), length);
        }
        Ok(length)
    }

    /// Length of a protein, decoys answered through their target.
    pub fn protein_length(&self, accession: &str) -> ProtreeResult<usize> {
        let index = self.index()?;
        let lookup = if index.default_reversed && is_decoy_accession(accession) {
            target_accession(accession)
        } else {
            accession
        };
        match self.stored_length(index, lookup)? {
            Some(length) => Ok(length),
            None => index.provider.protein_length(accession),
        }
    }

    /// Drop cached query results and resident nodes
    pub fn empty_cache(&self) {
        self.results.clear();
        self.nodes.empty();
    }

    /// Capacity of each query result tier; zero disables result caching.
    pub fn set_cache_size(&self, size: usize) {
        self.results.set_capacity(size);
    }

    pub fn cache_size(&self) -> usize {
        self.results.capacity()
    }

    /// Evict the oldest `share` of resident nodes.
    pub fn reduce_node_cache_size(&self, share: f64) -> ProtreeResult<()> {
        self.nodes.reduce(share)
    }

    pub fn nodes_in_cache(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_cache_footprint(&self) -> usize {
        self.nodes.footprint()
    }

    pub fn query_cache_stats(&self) -> QueryCacheStats {
        self.results.stats()
    }

    /// Flush and release the store. The tree can be initiated again afterwards.
    pub fn close(&mut self) -> ProtreeResult<()> {
        let stats = self.nodes.stats();
        if stats.hits + stats.misses > 0 {
            debug!(
                "Node cache: {} hits, {} misses, {} evictions",
                stats.hits, stats.misses, stats.evictions
            );
        }
        self.empty_cache();
        self.lengths.write().clear();
        if let Some(index) = self.index.take() {
            index.store.flush()?;
            debug!("Closed index at {:?}", index.location);
        }
        Ok(())
    }

    /// Close the tree and delete its store.
    pub fn delete_db(&mut self) -> ProtreeResult<()> {
        let location = self.index.as_ref().map(|index| index.location.clone());
        self.close()?;
        if let Some(location) = location {
            location.destroy()?;
            info!("Deleted index at {:?}", location);
        }
        Ok(())
    }
}

/// Store directory of a database file: below `storage.index_dir` when configured,
/// the default index directory otherwise.
pub fn store_dir(config: &Config, source: &Path, last_modified: SystemTime) -> PathBuf {
    let base = config
        .storage
        .index_dir
        .clone()
        .unwrap_or_else(protree_index_dir);
    store_path_in(&base, source, last_modified)
}

/// Delete the stored index of a database file, if any. Returns whether one existed.
pub fn delete_store(config: &Config, source: &Path, last_modified: SystemTime) -> ProtreeResult<bool> {
    let path = store_dir(config, source, last_modified);
    if !path.exists() {
        return Ok(false);
    }
    RocksDBBackend::destroy(&path)?;
    Ok(true)
}

impl Drop for ProteinTree {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close protein tree: {}", e);
        }
    }
}

fn normalize_peptide(peptide: &str) -> ProtreeResult<String> {
    if !peptide.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ProtreeError::InvalidInput(format!(
            "Peptide '{}' is not an amino acid sequence",
            peptide
        )));
    }
    Ok(peptide.to_ascii_uppercase())
}
