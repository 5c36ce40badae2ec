//! Residue matching under the configured ambiguity rules

use protree_bio::amino_acid::{combinations, indistinguishable_amino_acids, sub_amino_acids};
use protree_core::types::matching::x_share;
use protree_core::{MatchingMode, SequenceMatchingPreferences};

/// Protein residues a query residue may stand for, query residue first.
pub fn acceptable_residues(residue: char, preferences: &SequenceMatchingPreferences) -> Vec<char> {
    let mut residues = vec![residue];
    if preferences.mode == MatchingMode::Exact {
        return residues;
    }

    let mut push = |r: char| {
        if !residues.contains(&r) {
            residues.push(r);
        }
    };
    for &r in sub_amino_acids(residue) {
        push(r);
    }
    for &r in combinations(residue) {
        push(r);
    }
    if preferences.mode == MatchingMode::MassTolerant {
        for r in indistinguishable_amino_acids(residue, preferences.tolerance) {
            push(r);
        }
    }
    residues
}

pub fn residues_match(query: char, protein: char, preferences: &SequenceMatchingPreferences) -> bool {
    query == protein || acceptable_residues(query, preferences).contains(&protein)
}

/// Whether `candidate` realizes `pattern` residue by residue within the `X` share limit.
pub fn pattern_matches(
    pattern: &str,
    candidate: &str,
    preferences: &SequenceMatchingPreferences,
) -> bool {
    if pattern.len() != candidate.len() || !preferences.allows_x_share(candidate) {
        return false;
    }
    if preferences.is_exact() {
        return pattern == candidate;
    }
    pattern
        .chars()
        .zip(candidate.chars())
        .all(|(q, p)| residues_match(q, p, preferences))
}

/// Every seed tag the first residues of a peptide of `peptide_length` may be realized as.
///
/// The `X` limit applies to the whole peptide, so a seed tag may hold its share of the
/// peptide's allowance: `limit * peptide_length / tag_length`.
pub fn expand_seed_tags(
    tag: &str,
    peptide_length: usize,
    preferences: &SequenceMatchingPreferences,
) -> Vec<String> {
    let mut tags = vec![String::with_capacity(tag.len())];
    for residue in tag.chars() {
        let options = acceptable_residues(residue, preferences);
        tags = tags
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |&r| {
                    let mut next = prefix.clone();
                    next.push(r);
                    next
                })
            })
            .collect();
    }

    if let Some(limit) = preferences.limit_x {
        let tag_limit = limit * peptide_length as f64 / tag.len().max(1) as f64;
        if tag_limit < 1.0 {
            tags.retain(|t| x_share(t) <= tag_limit);
        }
    }
    tags
}
