//! Protein sequence utilities for protree

pub mod amino_acid;
pub mod enzyme;
pub mod formats;
pub mod provider;
pub mod sequence;

// Re-export commonly used types
pub use enzyme::{CleavageRule, Enzyme};
pub use formats::{parse_fasta, write_fasta};
pub use provider::{FastaProteins, SequenceProvider};
pub use sequence::{reverse_sequence, Protein};
