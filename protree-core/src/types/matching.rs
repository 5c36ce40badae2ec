//! Sequence matching preferences used while walking the tree

use serde::{Deserialize, Serialize};

/// Traversal expansion rule at each residue of a query peptide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MatchingMode {
    /// Literal residue only
    #[default]
    Exact,
    /// Residue, its sub-residues and the ambiguity codes covering it
    Combinatorial,
    /// Combinatorial plus residues of indistinguishable mass
    #[cfg_attr(feature = "cli", value(alias = "mass"))]
    MassTolerant,
}

/// How query residues are compared to protein residues.
///
/// Two preferences are equal when they would produce the same query results, which is
/// what the result caches key their validity on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceMatchingPreferences {
    pub mode: MatchingMode,
    /// Mass tolerance in Da, only consulted in `MassTolerant` mode
    pub tolerance: f64,
    /// Largest share of `X` residues a realized sequence may contain
    #[serde(default)]
    pub limit_x: Option<f64>,
}

impl Default for SequenceMatchingPreferences {
    fn default() -> Self {
        Self::exact()
    }
}

impl SequenceMatchingPreferences {
    pub fn exact() -> Self {
        Self {
            mode: MatchingMode::Exact,
            tolerance: 0.0,
            limit_x: None,
        }
    }

    pub fn combinatorial() -> Self {
        Self {
            mode: MatchingMode::Combinatorial,
            tolerance: 0.0,
            limit_x: None,
        }
    }

    pub fn mass_tolerant(tolerance: f64) -> Self {
        Self {
            mode: MatchingMode::MassTolerant,
            tolerance,
            limit_x: None,
        }
    }

    pub fn with_limit_x(mut self, share: f64) -> Self {
        self.limit_x = Some(share);
        self
    }

    pub fn is_exact(&self) -> bool {
        self.mode == MatchingMode::Exact
    }

    /// Whether `sequence` stays within the `X` share limit, if one is set.
    pub fn allows_x_share(&self, sequence: &str) -> bool {
        match self.limit_x {
            Some(limit) => x_share(sequence) <= limit,
            None => true,
        }
    }
}

/// Share of `X` residues in a sequence
pub fn x_share(sequence: &str) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    sequence.bytes().filter(|&b| b == b'X').count() as f64 / sequence.len() as f64
}
