//! Peptide to protein mapping results

use std::collections::HashMap;

/// Accession -> sorted, deduplicated offsets of a peptide in that protein
pub type ProteinMapping = HashMap<String, Vec<usize>>;

/// Realized peptide sequence -> protein mapping.
///
/// Ambiguous matching can realize several literal sequences from one query peptide,
/// so results are grouped by the sequence actually found in the proteins.
pub type PeptideMapping = HashMap<String, ProteinMapping>;

/// Merge `other` into `target`, keeping offsets sorted and unique.
pub fn merge_protein_mappings(target: &mut ProteinMapping, other: ProteinMapping) {
    for (accession, positions) in other {
        let entry = target.entry(accession).or_default();
        entry.extend(positions);
        entry.sort_unstable();
        entry.dedup();
    }
}

/// Merge `other` into `target` sequence by sequence.
pub fn merge_peptide_mappings(target: &mut PeptideMapping, other: PeptideMapping) {
    for (sequence, mapping) in other {
        match target.get_mut(&sequence) {
            Some(existing) => merge_protein_mappings(existing, mapping),
            None => {
                target.insert(sequence, mapping);
            }
        }
    }
}
