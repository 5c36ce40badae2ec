//! Access to the protein sequences an index is built from

use crate::formats::fasta::parse_fasta;
use crate::sequence::{is_decoy_accession, reverse_sequence, reversed_accession, Protein};
use protree_core::{ProtreeError, ProtreeResult};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Read access to the protein database backing an index.
///
/// Implementations must stay stable for the lifetime of one index: the store is keyed
/// by the source file identity and modification time.
pub trait SequenceProvider: Send + Sync {
    fn sequence(&self, accession: &str) -> ProtreeResult<Arc<str>>;

    fn protein_length(&self, accession: &str) -> ProtreeResult<usize> {
        Ok(self.sequence(accession)?.len())
    }

    /// All accessions, in database order
    fn accessions(&self) -> Vec<String>;

    fn is_decoy(&self, accession: &str) -> bool {
        is_decoy_accession(accession)
    }

    /// Whether every decoy is the reversed sequence of a target present in the database.
    ///
    /// Only targets are then indexed; decoy mappings are derived from them.
    fn is_default_reversed(&self) -> bool;

    fn source_path(&self) -> Option<&Path> {
        None
    }

    fn last_modified(&self) -> Option<SystemTime> {
        None
    }
}

/// Proteins held in memory, usually loaded from a FASTA file
#[derive(Debug, Default)]
pub struct FastaProteins {
    path: Option<PathBuf>,
    last_modified: Option<SystemTime>,
    sequences: HashMap<String, Arc<str>>,
    order: Vec<String>,
    default_reversed: bool,
}

impl FastaProteins {
    /// Load every protein of a FASTA file (supports .gz compression)
    pub fn open<P: AsRef<Path>>(path: P) -> ProtreeResult<Self> {
        let path = path.as_ref();
        let last_modified = std::fs::metadata(path)?.modified()?;
        let proteins = parse_fasta(path)?;
        info!(
            "Loaded {} proteins from {}",
            proteins.len(),
            path.display()
        );

        let mut provider = Self::from_proteins(proteins)?;
        provider.path = Some(path.to_path_buf());
        provider.last_modified = Some(last_modified);
        Ok(provider)
    }

    /// Build a provider from proteins; duplicate accessions are rejected.
    pub fn from_proteins<I>(proteins: I) -> ProtreeResult<Self>
    where
        I: IntoIterator<Item = Protein>,
    {
        let mut provider = Self::default();
        for protein in proteins {
            provider.push(protein)?;
        }
        provider.refresh_reversed_flag();
        Ok(provider)
    }

    /// Append the reversed decoy of every target that lacks one.
    pub fn with_decoys(mut self) -> ProtreeResult<Self> {
        let existing: HashSet<&String> = self.order.iter().collect();
        let decoys: Vec<Protein> = self
            .order
            .par_iter()
            .filter(|accession| !is_decoy_accession(accession))
            .map(|accession| {
                Protein::new(accession.as_str(), &*self.sequences[accession]).to_decoy()
            })
            .filter(|decoy| !existing.contains(&decoy.accession))
            .collect();
        debug!("Generated {} decoy proteins", decoys.len());

        for decoy in decoys {
            self.push(decoy)?;
        }
        self.refresh_reversed_flag();
        Ok(self)
    }

    fn push(&mut self, protein: Protein) -> ProtreeResult<()> {
        if self.sequences.contains_key(&protein.accession) {
            return Err(ProtreeError::InvalidInput(format!(
                "Duplicate accession {}",
                protein.accession
            )));
        }
        self.order.push(protein.accession.clone());
        self.sequences
            .insert(protein.accession, Arc::from(protein.sequence));
        Ok(())
    }

    /// Target/decoy only when decoys and targets pair up completely and every decoy is
    /// its target reversed. Decoy mappings are derived from targets alone in that case.
    fn refresh_reversed_flag(&mut self) {
        let (decoys, targets): (Vec<&String>, Vec<&String>) =
            self.order.iter().partition(|a| is_decoy_accession(a));
        let paired = !decoys.is_empty()
            && decoys.len() == targets.len()
            && targets.iter().all(|target| {
                let decoy = self.sequences.get(&reversed_accession(target));
                match (decoy, self.sequences.get(target.as_str())) {
                    (Some(decoy), Some(target)) => **decoy == reverse_sequence(target),
                    _ => false,
                }
            });
        self.default_reversed = paired;
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SequenceProvider for FastaProteins {
    fn sequence(&self, accession: &str) -> ProtreeResult<Arc<str>> {
        self.sequences
            .get(accession)
            .cloned()
            .ok_or_else(|| ProtreeError::SequenceNotFound(accession.to_string()))
    }

    fn protein_length(&self, accession: &str) -> ProtreeResult<usize> {
        self.sequences
            .get(accession)
            .map(|s| s.len())
            .ok_or_else(|| ProtreeError::SequenceNotFound(accession.to_string()))
    }

    fn accessions(&self) -> Vec<String> {
        self.order.clone()
    }

    fn is_default_reversed(&self) -> bool {
        self.default_reversed
    }

    fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FastaProteins {
        FastaProteins::from_proteins(vec![
            Protein::new("P1", "PEPTIDEK"),
            Protein::new("P2", "TIDEKPEP"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let provider = sample();
        assert_eq!(provider.len(), 2);
        assert_eq!(&*provider.sequence("P1").unwrap(), "PEPTIDEK");
        assert_eq!(provider.protein_length("P2").unwrap(), 8);
        assert_eq!(provider.accessions(), vec!["P1", "P2"]);
        assert!(matches!(
            provider.sequence("P3"),
            Err(ProtreeError::SequenceNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_accession_rejected() {
        let result = FastaProteins::from_proteins(vec![
            Protein::new("P1", "AAA"),
            Protein::new("P1", "CCC"),
        ]);
        assert!(matches!(result, Err(ProtreeError::InvalidInput(_))));
    }

    #[test]
    fn test_with_decoys() {
        let provider = sample();
        assert!(!provider.is_default_reversed());

        let provider = provider.with_decoys().unwrap();
        assert_eq!(provider.len(), 4);
        assert!(provider.is_default_reversed());
        assert_eq!(&*provider.sequence("P1_REVERSED").unwrap(), "KEDITPEP");
        assert!(provider.is_decoy("P2_REVERSED"));

        // Already complete, nothing is added
        let provider = provider.with_decoys().unwrap();
        assert_eq!(provider.len(), 4);
    }

    #[test]
    fn test_orphan_decoy_is_not_default_reversed() {
        let provider = FastaProteins::from_proteins(vec![
            Protein::new("P1", "AAA"),
            Protein::new("P9_REVERSED", "CCC"),
        ])
        .unwrap();
        assert!(!provider.is_default_reversed());
    }

    #[test]
    fn test_partially_reversed_database_is_not_default_reversed() {
        let provider = FastaProteins::from_proteins(vec![
            Protein::new("P1", "PEPTIDEK"),
            Protein::new("P1_REVERSED", "KEDITPEP"),
            Protein::new("P2", "WWACDWW"),
        ])
        .unwrap();
        assert!(!provider.is_default_reversed());

        // Completing the pairing turns it on
        assert!(provider.with_decoys().unwrap().is_default_reversed());
    }

    #[test]
    fn test_decoy_that_is_not_a_reversal_is_not_default_reversed() {
        let provider = FastaProteins::from_proteins(vec![
            Protein::new("P1", "PEPTIDEK"),
            Protein::new("P1_REVERSED", "PEPTIDEK"),
        ])
        .unwrap();
        assert!(!provider.is_default_reversed());
    }

    #[test]
    fn test_in_memory_has_no_source() {
        let provider = sample();
        assert!(provider.source_path().is_none());
        assert!(provider.last_modified().is_none());
    }
}
