//! Verification of leaf candidates against the protein sequences
//!
//! A leaf only guarantees that its tag occurs at the stored offsets; the rest of the
//! peptide is checked here. Candidates are split into batches, each verified by one
//! scoped worker that sends its private mapping back over a bounded channel.

use crossbeam::channel::bounded;
use protree_bio::SequenceProvider;
use protree_core::types::mapping::merge_peptide_mappings;
use protree_core::{PeptideMapping, ProtreeError, ProtreeResult, SequenceMatchingPreferences};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::matching::pattern_matches;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPool {
    batch_size: usize,
    max_workers: usize,
}

impl VerificationPool {
    pub fn new(batch_size: usize, max_workers: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_workers: max_workers.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Confirm which candidate offsets start a realization of `peptide`, grouped by
    /// the sequence found in the protein.
    ///
    /// An accession whose sequence cannot be read is logged and left out.
    pub fn verify<P: SequenceProvider + ?Sized>(
        &self,
        provider: &P,
        candidates: &BTreeMap<String, Vec<usize>>,
        peptide: &str,
        preferences: &SequenceMatchingPreferences,
    ) -> ProtreeResult<PeptideMapping> {
        let entries: Vec<(&String, &Vec<usize>)> = candidates.iter().collect();
        let batches: Vec<&[(&String, &Vec<usize>)]> = entries.chunks(self.batch_size).collect();

        if batches.len() <= 1 {
            return Ok(verify_batch(provider, &entries, peptide, preferences));
        }

        debug!(
            "Verifying {} accessions for {} in {} batches",
            entries.len(),
            peptide,
            batches.len()
        );

        let max_workers = self.max_workers;
        crossbeam::thread::scope(|scope| {
            let (sender, receiver) = bounded::<PeptideMapping>(max_workers);
            let mut result = PeptideMapping::new();
            let mut outstanding = 0;

            for batch in batches {
                if outstanding == max_workers {
                    if let Ok(part) = receiver.recv() {
                        merge_peptide_mappings(&mut result, part);
                        outstanding -= 1;
                    }
                }
                let sender = sender.clone();
                scope.spawn(move |_| {
                    let part = verify_batch(provider, batch, peptide, preferences);
                    // The coordinator outlives every worker
                    let _ = sender.send(part);
                });
                outstanding += 1;
            }

            drop(sender);
            for part in receiver.iter() {
                merge_peptide_mappings(&mut result, part);
            }
            result
        })
        .map_err(|_| ProtreeError::Other(format!("Verification worker panicked for {}", peptide)))
    }
}

fn verify_batch<P: SequenceProvider + ?Sized>(
    provider: &P,
    batch: &[(&String, &Vec<usize>)],
    peptide: &str,
    preferences: &SequenceMatchingPreferences,
) -> PeptideMapping {
    let mut mapping = PeptideMapping::new();
    let length = peptide.len();

    for (accession, positions) in batch {
        let sequence = match provider.sequence(accession) {
            Ok(sequence) => sequence,
            Err(e) => {
                warn!("Skipping {} while verifying {}: {}", accession, peptide, e);
                continue;
            }
        };

        for &position in positions.iter() {
            let end = position + length;
            let Some(candidate) = sequence.get(position..end) else {
                continue;
            };
            if pattern_matches(peptide, candidate, preferences) {
                mapping
                    .entry(candidate.to_string())
                    .or_default()
                    .entry((*accession).clone())
                    .or_default()
                    .push(position);
            }
        }
    }
    mapping
}
