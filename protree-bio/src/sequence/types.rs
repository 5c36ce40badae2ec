use serde::{Deserialize, Serialize};
use std::fmt;

/// Accession suffix marking a reversed decoy protein
pub const DECOY_SUFFIX: &str = "_REVERSED";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protein {
    pub accession: String,
    pub description: Option<String>,
    /// Upper-case one letter residues
    pub sequence: String,
}

impl Protein {
    pub fn new(accession: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            accession: accession.into(),
            description: None,
            sequence: sequence.into(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_decoy(&self) -> bool {
        is_decoy_accession(&self.accession)
    }

    /// Reversed copy of this protein under its decoy accession.
    pub fn to_decoy(&self) -> Protein {
        Protein {
            accession: decoy_accession(&self.accession),
            description: self.description.as_ref().map(|d| format!("{}-REVERSED", d)),
            sequence: reverse_sequence(&self.sequence),
        }
    }

    pub fn header(&self) -> String {
        match &self.description {
            Some(desc) => format!(">{} {}", self.accession, desc),
            None => format!(">{}", self.accession),
        }
    }
}

impl fmt::Display for Protein {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} aa)", self.accession, self.len())
    }
}

pub fn is_decoy_accession(accession: &str) -> bool {
    accession.ends_with(DECOY_SUFFIX)
}

pub fn decoy_accession(target: &str) -> String {
    format!("{}{}", target, DECOY_SUFFIX)
}

/// Target accession of a decoy, or the accession itself when it is not a decoy.
pub fn target_accession(decoy: &str) -> &str {
    decoy.strip_suffix(DECOY_SUFFIX).unwrap_or(decoy)
}

/// Counterpart accession across the target/decoy divide.
pub fn reversed_accession(accession: &str) -> String {
    if is_decoy_accession(accession) {
        target_accession(accession).to_string()
    } else {
        decoy_accession(accession)
    }
}

pub fn reverse_sequence(sequence: &str) -> String {
    sequence.chars().rev().collect()
}
