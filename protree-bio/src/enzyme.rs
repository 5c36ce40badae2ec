//! Enzyme cleavage rules restricting where seed tags may start

use protree_core::ProtreeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Predicate deciding whether a protein is cleaved between two residues
pub trait CleavageRule: Send + Sync {
    fn is_cleavage_site(&self, before: char, after: char) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Enzyme {
    /// After K or R, not before P
    Trypsin,
    /// After K
    LysC,
    /// After R
    ArgC,
}

impl CleavageRule for Enzyme {
    fn is_cleavage_site(&self, before: char, after: char) -> bool {
        match self {
            Enzyme::Trypsin => matches!(before, 'K' | 'R') && after != 'P',
            Enzyme::LysC => before == 'K',
            Enzyme::ArgC => before == 'R',
        }
    }
}

impl Enzyme {
    pub fn name(&self) -> &'static str {
        match self {
            Enzyme::Trypsin => "trypsin",
            Enzyme::LysC => "lys-c",
            Enzyme::ArgC => "arg-c",
        }
    }
}

impl fmt::Display for Enzyme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Enzyme {
    type Err = ProtreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trypsin" => Ok(Enzyme::Trypsin),
            "lys-c" | "lysc" => Ok(Enzyme::LysC),
            "arg-c" | "argc" => Ok(Enzyme::ArgC),
            other => Err(ProtreeError::Configuration(format!(
                "Unknown enzyme '{}' (expected trypsin, lys-c or arg-c)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trypsin() {
        assert!(Enzyme::Trypsin.is_cleavage_site('K', 'A'));
        assert!(Enzyme::Trypsin.is_cleavage_site('R', 'G'));
        assert!(!Enzyme::Trypsin.is_cleavage_site('K', 'P'));
        assert!(!Enzyme::Trypsin.is_cleavage_site('A', 'K'));
    }

    #[test]
    fn test_lys_c_and_arg_c() {
        assert!(Enzyme::LysC.is_cleavage_site('K', 'P'));
        assert!(!Enzyme::LysC.is_cleavage_site('R', 'A'));
        assert!(Enzyme::ArgC.is_cleavage_site('R', 'P'));
        assert!(!Enzyme::ArgC.is_cleavage_site('K', 'A'));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Trypsin".parse::<Enzyme>().unwrap(), Enzyme::Trypsin);
        assert_eq!("lys-c".parse::<Enzyme>().unwrap(), Enzyme::LysC);
        assert_eq!("ArgC".parse::<Enzyme>().unwrap(), Enzyme::ArgC);
        assert!(matches!(
            "pepsin".parse::<Enzyme>(),
            Err(ProtreeError::Configuration(_))
        ));
    }

    #[test]
    fn test_display_round_trip() {
        for enzyme in [Enzyme::Trypsin, Enzyme::LysC, Enzyme::ArgC] {
            assert_eq!(enzyme.to_string().parse::<Enzyme>().unwrap(), enzyme);
        }
    }
}
