//! Custom assertions for testing
//!
//! Checks for peptide mappings and FASTA content.

use protree_bio::amino_acid::is_amino_acid;
use protree_bio::SequenceProvider;
use protree_core::PeptideMapping;

/// Assert that a FASTA content is valid protein FASTA
pub fn assert_valid_fasta(content: &str) {
    let lines: Vec<&str> = content.lines().collect();
    assert!(!lines.is_empty(), "FASTA content is empty");

    let mut has_header = false;
    let mut has_sequence = false;

    for line in lines {
        if let Some(header) = line.strip_prefix('>') {
            assert!(!header.trim().is_empty(), "Empty FASTA header found");
            has_header = true;
        } else if !line.is_empty() {
            assert!(
                line.chars().all(|c| is_amino_acid(c.to_ascii_uppercase())),
                "Invalid residue found: {}",
                line
            );
            has_sequence = true;
        }
    }

    assert!(has_header, "No FASTA headers found");
    assert!(has_sequence, "No sequences found");
}

/// Assert that `accession` is reported at `position` for some realized sequence
pub fn assert_mapping_contains(mapping: &PeptideMapping, accession: &str, position: usize) {
    let found = mapping.values().any(|proteins| {
        proteins
            .get(accession)
            .is_some_and(|positions| positions.contains(&position))
    });
    assert!(
        found,
        "Expected {}@{} in mapping {:?}",
        accession, position, mapping
    );
}

/// Assert that every reported offset spells its realized sequence in the protein
pub fn assert_offsets_realize<P>(mapping: &PeptideMapping, provider: &P)
where
    P: SequenceProvider + ?Sized,
{
    for (sequence, proteins) in mapping {
        for (accession, positions) in proteins {
            let protein = provider
                .sequence(accession)
                .unwrap_or_else(|e| panic!("Failed to load {}: {}", accession, e));
            for &position in positions {
                assert_eq!(
                    protein.get(position..position + sequence.len()),
                    Some(sequence.as_str()),
                    "{}@{} does not spell {}",
                    accession,
                    position,
                    sequence
                );
            }
        }
    }
}

/// Assert that positions are sorted and distinct for every protein
pub fn assert_positions_sorted(mapping: &PeptideMapping) {
    for (sequence, proteins) in mapping {
        for (accession, positions) in proteins {
            assert!(
                positions.windows(2).all(|w| w[0] < w[1]),
                "Unsorted positions for {} in {}: {:?}",
                sequence,
                accession,
                positions
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_proteins;
    use std::collections::HashMap;

    fn tide() -> PeptideMapping {
        HashMap::from([(
            "TIDE".to_string(),
            HashMap::from([("P1".to_string(), vec![3]), ("P2".to_string(), vec![0])]),
        )])
    }

    #[test]
    fn test_valid_fasta() {
        assert_valid_fasta(">P1\nPEPTIDEK\n>P2 desc\nTIDEKPEP\n");
    }

    #[test]
    #[should_panic(expected = "No sequences found")]
    fn test_fasta_without_sequences() {
        assert_valid_fasta(">P1\n");
    }

    #[test]
    fn test_mapping_assertions() {
        let provider = sample_proteins().build().unwrap();
        let mapping = tide();
        assert_mapping_contains(&mapping, "P1", 3);
        assert_offsets_realize(&mapping, &provider);
        assert_positions_sorted(&mapping);
    }

    #[test]
    #[should_panic(expected = "does not spell")]
    fn test_wrong_offset_is_reported() {
        let provider = sample_proteins().build().unwrap();
        let mut mapping = tide();
        mapping.get_mut("TIDE").unwrap().insert("P1".to_string(), vec![2]);
        assert_offsets_realize(&mapping, &provider);
    }
}
