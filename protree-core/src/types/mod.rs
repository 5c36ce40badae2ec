/// Core types shared across all protree crates
pub mod format;
pub mod mapping;
pub mod matching;

pub use format::OutputFormat;
pub use mapping::{merge_peptide_mappings, merge_protein_mappings, PeptideMapping, ProteinMapping};
pub use matching::{MatchingMode, SequenceMatchingPreferences};
