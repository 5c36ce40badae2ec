//! Import of a protein database into the node table
//!
//! Seed tags are processed in passes sized to the memory budget. Each pass scans every
//! protein once and accumulates the offsets of the pass's tags. Every tag is then split
//! and its subtree written out and dropped before the next one is held.

use protree_bio::amino_acid::AMINO_ACIDS;
use protree_bio::{CleavageRule, SequenceProvider};
use protree_core::{Config, ProtreeError, ProtreeResult, INDEX_VERSION};
use protree_storage::io::metadata;
use protree_storage::{IndexStore, Table};
use crossbeam::channel::bounded;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, info_span};

use crate::codec::encode_node;
use crate::node::{Node, NodeRef};
use crate::progress::WaitingHandler;

/// Tag -> accession -> offsets accumulated during a pass
type TagOffsets = HashMap<String, BTreeMap<String, Vec<usize>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub initial_tag_size: usize,
    pub max_node_size: usize,
    /// Deepest node that may still be split
    pub max_depth: usize,
    /// Budget in accession-count units used to size passes
    pub memory_budget: usize,
    pub threads: usize,
    pub protein_batch_size: usize,
    pub tag_coverage_percent: usize,
}

impl ImportSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_tag_size: config.tree.initial_tag_size,
            max_node_size: config.tree.max_node_size,
            max_depth: config.tree.max_peptide_size,
            memory_budget: config.tree.memory_budget,
            threads: config.import.effective_threads(),
            protein_batch_size: config.import.protein_batch_size.max(1),
            tag_coverage_percent: config.import.tag_coverage_percent,
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub proteins: usize,
    pub passes: usize,
    pub tags_with_data: usize,
    pub nodes_written: usize,
}

/// Every tag of length `size` over the one letter alphabet, in lexicographic order
/// of the alphabet table.
pub fn enumerate_tags(size: usize) -> Vec<String> {
    let mut tags = vec![String::new()];
    for _ in 0..size {
        tags = tags
            .into_iter()
            .flat_map(|prefix| {
                AMINO_ACIDS.iter().map(move |&residue| {
                    let mut tag = prefix.clone();
                    tag.push(residue);
                    tag
                })
            })
            .collect();
    }
    tags
}

/// Number of tags one pass may hold given the budget.
pub fn tags_per_pass(n_accessions: usize, coverage_percent: usize, budget: usize, n_tags: usize) -> usize {
    let per_tag = n_accessions.saturating_mul(coverage_percent) / 100;
    if per_tag == 0 {
        return n_tags.max(1);
    }
    (budget / per_tag).clamp(1, n_tags.max(1))
}

/// Offsets of `sequence` where one of `tags` starts.
///
/// With a cleavage rule only the protein start and cleavage sites are valid starts.
pub fn scan_sequence(
    sequence: &str,
    tag_size: usize,
    tags: &HashSet<String>,
    enzyme: Option<&dyn CleavageRule>,
) -> Vec<(String, usize)> {
    let residues = sequence.as_bytes();
    if tag_size == 0 || residues.len() < tag_size {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for start in 0..=residues.len() - tag_size {
        let valid = match enzyme {
            None => true,
            Some(_) if start == 0 => true,
            Some(rule) => rule.is_cleavage_site(residues[start - 1] as char, residues[start] as char),
        };
        if !valid {
            continue;
        }
        let Some(tag) = sequence.get(start..start + tag_size) else {
            continue;
        };
        if tags.contains(tag) {
            hits.push((tag.to_string(), start));
        }
    }
    hits
}

pub struct TreeBuilder<'a, P: SequenceProvider + ?Sized, S: IndexStore + ?Sized> {
    provider: &'a P,
    store: &'a S,
    settings: ImportSettings,
    enzyme: Option<&'a dyn CleavageRule>,
    handler: &'a dyn WaitingHandler,
}

impl<'a, P: SequenceProvider + ?Sized, S: IndexStore + ?Sized> TreeBuilder<'a, P, S> {
    pub fn new(
        provider: &'a P,
        store: &'a S,
        settings: ImportSettings,
        handler: &'a dyn WaitingHandler,
    ) -> Self {
        Self {
            provider,
            store,
            settings,
            enzyme: None,
            handler,
        }
    }

    pub fn with_enzyme(mut self, enzyme: Option<&'a dyn CleavageRule>) -> Self {
        self.enzyme = enzyme;
        self
    }

    /// Accessions whose sequences go into the tree. Decoys of a target/decoy database
    /// are answered by reversal and are not indexed.
    fn indexed_accessions(&self) -> Vec<String> {
        let accessions = self.provider.accessions();
        if self.provider.is_default_reversed() {
            accessions
                .into_iter()
                .filter(|a| !self.provider.is_decoy(a))
                .collect()
        } else {
            accessions
        }
    }

    fn check_canceled(&self) -> ProtreeResult<()> {
        if self.handler.is_canceled() {
            Err(ProtreeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Import every seed tag and mark the store complete.
    ///
    /// On cancellation the store is left incomplete so the next open reimports.
    pub fn build(&self) -> ProtreeResult<ImportSummary> {
        let settings = &self.settings;
        let accessions = self.indexed_accessions();
        let _span = info_span!(
            "import",
            tag_size = settings.initial_tag_size,
            proteins = accessions.len()
        )
        .entered();
        let started = Instant::now();

        metadata::set_import_complete(self.store, false)?;
        metadata::set_initial_tag_size(self.store, settings.initial_tag_size)?;

        let mut tags = enumerate_tags(settings.initial_tag_size);
        let per_pass = tags_per_pass(
            accessions.len(),
            settings.tag_coverage_percent,
            settings.memory_budget,
            tags.len(),
        );
        let passes = tags.len().div_ceil(per_pass);
        if passes > 1 {
            tags.shuffle(&mut rand::thread_rng());
        }
        info!(
            "Importing {} proteins: {} passes of up to {} tags",
            accessions.len(),
            passes,
            per_pass
        );

        self.handler
            .set_max((passes * accessions.len() + tags.len()) as u64);

        let pool = if settings.threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(settings.threads)
                    .build()
                    .map_err(|e| ProtreeError::Other(format!("Cannot start import threads: {}", e)))?,
            )
        } else {
            None
        };

        let mut summary = ImportSummary {
            proteins: accessions.len(),
            passes,
            ..Default::default()
        };

        for (pass, chunk) in tags.chunks(per_pass).enumerate() {
            self.check_canceled()?;
            self.handler
                .set_message(&format!("Import pass {}/{}", pass + 1, passes));
            let pass_tags: HashSet<String> = chunk.iter().cloned().collect();

            let offsets = match &pool {
                Some(pool) => pool.install(|| self.scan_parallel(&accessions, &pass_tags))?,
                None => self.scan_sequential(&accessions, &pass_tags)?,
            };
            let (tags_with_data, nodes_written) = match &pool {
                Some(pool) => self.split_parallel(pool, offsets)?,
                None => self.split_sequential(offsets)?,
            };

            summary.tags_with_data += tags_with_data;
            summary.nodes_written += nodes_written;
            for _ in chunk {
                self.handler.increment();
            }
            debug!("Pass {}/{} done", pass + 1, passes);
        }

        self.check_canceled()?;
        self.handler.set_message("Writing protein lengths");
        self.write_lengths(&accessions)?;
        metadata::set_version(self.store, INDEX_VERSION)?;
        if let Some(path) = self.provider.source_path() {
            metadata::set_fasta_path(self.store, &path.to_string_lossy())?;
        }
        self.store.flush()?;
        self.handler.set_message("Compacting store");
        self.store.compact()?;
        metadata::set_import_complete(self.store, true)?;
        self.store.flush()?;

        self.handler.finish();
        info!(
            "Import finished in {:.1}s: {} nodes for {} seed tags",
            started.elapsed().as_secs_f64(),
            summary.nodes_written,
            summary.tags_with_data
        );
        Ok(summary)
    }

    fn scan_batch(&self, batch: &[String], tags: &HashSet<String>) -> ProtreeResult<TagOffsets> {
        let mut offsets = TagOffsets::new();
        for accession in batch {
            self.check_canceled()?;
            let sequence = self.provider.sequence(accession)?;
            for (tag, start) in scan_sequence(&sequence, self.settings.initial_tag_size, tags, self.enzyme) {
                offsets
                    .entry(tag)
                    .or_default()
                    .entry(accession.clone())
                    .or_default()
                    .push(start);
            }
            self.handler.increment();
        }
        Ok(offsets)
    }

    fn scan_sequential(&self, accessions: &[String], tags: &HashSet<String>) -> ProtreeResult<TagOffsets> {
        self.scan_batch(accessions, tags)
    }

    fn scan_parallel(&self, accessions: &[String], tags: &HashSet<String>) -> ProtreeResult<TagOffsets> {
        let parts: Vec<TagOffsets> = accessions
            .par_chunks(self.settings.protein_batch_size)
            .map(|batch| self.scan_batch(batch, tags))
            .collect::<ProtreeResult<_>>()?;

        // Batches hold disjoint accessions, so per-accession offsets never need merging
        let mut merged = TagOffsets::new();
        for part in parts {
            for (tag, by_accession) in part {
                merged.entry(tag).or_default().extend(by_accession);
            }
        }
        Ok(merged)
    }

    fn split_tag(
        &self,
        tag: String,
        by_accession: BTreeMap<String, Vec<usize>>,
    ) -> ProtreeResult<Vec<(NodeRef, Node)>> {
        self.check_canceled()?;
        let tag = NodeRef::new(tag);
        let mut root = Node::new(self.settings.initial_tag_size);
        for (accession, positions) in by_accession {
            root.add_accession(accession, positions)?;
        }
        let mut created = Vec::new();
        root.split_node(
            &tag,
            self.settings.max_node_size,
            self.settings.max_depth,
            self.provider,
            &mut created,
        )?;
        created.push((tag, root));
        Ok(created)
    }

    /// Split and write one seed tag at a time. Returns (tags, nodes written).
    fn split_sequential(&self, offsets: TagOffsets) -> ProtreeResult<(usize, usize)> {
        let mut counts = (0, 0);
        for (tag, by_accession) in offsets {
            let subtree = self.split_tag(tag, by_accession)?;
            counts.0 += 1;
            counts.1 += self.persist(subtree)?;
        }
        Ok(counts)
    }

    /// Split seed tags on the pool while this thread writes each finished subtree.
    ///
    /// At most one finished subtree per worker waits in the channel.
    fn split_parallel(
        &self,
        pool: &rayon::ThreadPool,
        offsets: TagOffsets,
    ) -> ProtreeResult<(usize, usize)> {
        let (sender, receiver) = bounded::<ProtreeResult<Vec<(NodeRef, Node)>>>(self.settings.threads);
        pool.in_place_scope(|scope| -> ProtreeResult<(usize, usize)> {
            scope.spawn(move |_| {
                // A send fails once the writer stopped on an error; splitting stops with it
                let _ = offsets
                    .into_par_iter()
                    .try_for_each_with(sender, |sender, (tag, by_accession)| {
                        sender.send(self.split_tag(tag, by_accession))
                    });
            });

            let mut counts = (0, 0);
            for subtree in receiver {
                counts.0 += 1;
                counts.1 += self.persist(subtree?)?;
            }
            Ok(counts)
        })
    }

    /// Write the nodes of one seed tag and return how many were written.
    fn persist(&self, subtree: Vec<(NodeRef, Node)>) -> ProtreeResult<usize> {
        self.check_canceled()?;
        let entries = subtree
            .iter()
            .map(|(tag, node)| Ok((tag.as_str().to_string(), encode_node(node)?)))
            .collect::<ProtreeResult<Vec<_>>>()?;
        self.store.put_batch(Table::Nodes, &entries)?;
        Ok(entries.len())
    }

    fn write_lengths(&self, accessions: &[String]) -> ProtreeResult<()> {
        let lengths = accessions
            .iter()
            .map(|accession| Ok((accession.clone(), self.provider.protein_length(accession)?)))
            .collect::<ProtreeResult<Vec<_>>>()?;
        metadata::put_protein_lengths(self.store, &lengths)?;
        Ok(())
    }
}
