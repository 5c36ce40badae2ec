//! Decoy mappings derived from target mappings
//!
//! A decoy protein is its target reversed, so a peptide found in a target at `index`
//! occurs reversed in the decoy at `length - index - peptide_length`. The same formula
//! maps decoy offsets back onto the target.

use protree_bio::sequence::{reverse_sequence, reversed_accession, target_accession};
use protree_core::types::mapping::merge_protein_mappings;
use protree_core::{PeptideMapping, ProteinMapping, ProtreeError, ProtreeResult};

/// Offset of the reversed peptide in the reversed protein.
pub fn reversed_index(
    accession: &str,
    peptide: &str,
    index: usize,
    length: usize,
) -> ProtreeResult<usize> {
    let reversed = length as i64 - index as i64 - peptide.len() as i64;
    if reversed < 0 || reversed >= length as i64 {
        return Err(ProtreeError::IndexCoordinate {
            accession: accession.to_string(),
            peptide: peptide.to_string(),
            index: reversed,
            length,
        });
    }
    Ok(reversed as usize)
}

/// Mirror a mapping across the target/decoy divide.
///
/// Sequences are reversed and each accession is replaced by its counterpart.
/// `protein_length` is asked for target accessions only; `None` means the length is
/// unknown, which is reported as a coordinate violation.
pub fn reverse_mapping<F>(mapping: &PeptideMapping, protein_length: F) -> ProtreeResult<PeptideMapping>
where
    F: Fn(&str) -> ProtreeResult<Option<usize>>,
{
    let mut reversed = PeptideMapping::new();
    for (sequence, proteins) in mapping {
        let reversed_sequence = reverse_sequence(sequence);
        let mut translated = ProteinMapping::new();
        for (accession, positions) in proteins {
            let target = target_accession(accession);
            let length = protein_length(target)?.ok_or_else(|| ProtreeError::IndexCoordinate {
                accession: accession.clone(),
                peptide: sequence.clone(),
                index: positions.first().map_or(-1, |&p| p as i64),
                length: 0,
            })?;

            let mut offsets = positions
                .iter()
                .map(|&index| reversed_index(accession, sequence, index, length))
                .collect::<ProtreeResult<Vec<_>>>()?;
            offsets.sort_unstable();
            merge_protein_mappings(
                &mut translated,
                ProteinMapping::from([(reversed_accession(accession), offsets)]),
            );
        }
        reversed.insert(reversed_sequence, translated);
    }
    Ok(reversed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lengths(accession: &str) -> ProtreeResult<Option<usize>> {
        Ok(match accession {
            "P1" => Some(8),
            "P2" => Some(8),
            _ => None,
        })
    }

    #[test]
    fn test_reversed_index() {
        // TIDE at 3 in PEPTIDEK -> EDIT at 1 in KEDITPEP
        assert_eq!(reversed_index("P1", "TIDE", 3, 8).unwrap(), 1);
        assert_eq!(reversed_index("P1", "PEPT", 0, 8).unwrap(), 4);
        assert_eq!(reversed_index("P1", "DEK", 5, 8).unwrap(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_fatal() {
        let result = reversed_index("P1", "TIDE", 6, 8);
        assert!(matches!(
            result,
            Err(ProtreeError::IndexCoordinate { index: -2, length: 8, .. })
        ));
    }

    #[test]
    fn test_reverse_mapping_both_ways() {
        let forward: PeptideMapping = HashMap::from([(
            "TIDE".to_string(),
            HashMap::from([("P1".to_string(), vec![3]), ("P2".to_string(), vec![0])]),
        )]);

        let decoys = reverse_mapping(&forward, lengths).unwrap();
        assert_eq!(
            decoys,
            HashMap::from([(
                "EDIT".to_string(),
                HashMap::from([
                    ("P1_REVERSED".to_string(), vec![1]),
                    ("P2_REVERSED".to_string(), vec![4]),
                ])
            )])
        );

        assert_eq!(reverse_mapping(&decoys, lengths).unwrap(), forward);
    }

    #[test]
    fn test_unknown_length_is_fatal() {
        let mapping: PeptideMapping = HashMap::from([(
            "TIDE".to_string(),
            HashMap::from([("P9".to_string(), vec![0])]),
        )]);
        assert!(matches!(
            reverse_mapping(&mapping, lengths),
            Err(ProtreeError::IndexCoordinate { length: 0, .. })
        ));
    }
}
