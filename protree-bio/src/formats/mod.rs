pub mod fasta;

// Re-export commonly used functions
pub use fasta::{extract_accession, parse_fasta, parse_fasta_from_bytes, write_fasta};
