//! Core error types for protree

use thiserror::Error;

/// Main error type for protein tree operations
#[derive(Error, Debug)]
pub enum ProtreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// The store failed a consistency check or an import was interrupted by an error.
    #[error("Corrupted index: {0}")]
    Corrupted(String),

    /// Stored parameters do not match the requested ones; the index must be rebuilt.
    #[error("Stale index: {0}")]
    StaleIndex(String),

    #[error("Peptide '{peptide}' is shorter than the seed tag length ({min_length})")]
    PeptideTooShort { peptide: String, min_length: usize },

    /// A translated decoy offset fell outside the protein bounds.
    #[error("Index {index} out of bounds for peptide {peptide} in protein {accession} of length {length}")]
    IndexCoordinate {
        accession: String,
        peptide: String,
        index: i64,
        length: usize,
    },

    #[error("Sequence not found for accession {0}")]
    SequenceNotFound(String),

    #[error("Attempting to read past the end of protein {accession} at index {index}")]
    TerminusOverrun { accession: String, index: usize },

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias for protree operations
pub type ProtreeResult<T> = Result<T, ProtreeError>;

impl ProtreeError {
    /// Process exit code used by the command line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProtreeError::Configuration(_) => 2,
            ProtreeError::Io(_) => 3,
            ProtreeError::Parse(_)
            | ProtreeError::InvalidInput(_)
            | ProtreeError::PeptideTooShort { .. } => 4,
            ProtreeError::Storage(_)
            | ProtreeError::Corrupted(_)
            | ProtreeError::StaleIndex(_)
            | ProtreeError::Serialization(_) => 5,
            _ => 1,
        }
    }

    /// Whether the error invalidates the persistent index.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            ProtreeError::Corrupted(_)
                | ProtreeError::Storage(_)
                | ProtreeError::Serialization(_)
                | ProtreeError::Io(_)
                | ProtreeError::Parse(_)
                | ProtreeError::TerminusOverrun { .. }
                | ProtreeError::SequenceNotFound(_)
        )
    }
}

// Conversion implementations for common error types
impl From<serde_json::Error> for ProtreeError {
    fn from(err: serde_json::Error) -> Self {
        ProtreeError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for ProtreeError {
    fn from(err: bincode::Error) -> Self {
        ProtreeError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ProtreeError {
    fn from(err: anyhow::Error) -> Self {
        ProtreeError::Storage(format!("{:#}", err))
    }
}
