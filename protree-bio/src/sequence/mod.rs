pub mod types;

// Re-export commonly used types
pub use types::{
    decoy_accession, is_decoy_accession, reverse_sequence, reversed_accession, target_accession,
    Protein, DECOY_SUFFIX,
};
