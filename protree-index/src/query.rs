//! Tree traversal answering peptide queries

use protree_bio::SequenceProvider;
use protree_core::types::mapping::{merge_peptide_mappings, merge_protein_mappings};
use protree_core::{PeptideMapping, ProteinMapping, ProtreeError, ProtreeResult, SequenceMatchingPreferences};
use protree_storage::IndexStore;
use tracing::trace;

use crate::cache::NodeCache;
use crate::matching::{acceptable_residues, expand_seed_tags};
use crate::node::{Node, NodeRef};
use crate::verify::VerificationPool;

/// Everything a traversal reads from
pub struct Traversal<'a> {
    pub store: &'a dyn IndexStore,
    pub provider: &'a dyn SequenceProvider,
    pub nodes: &'a NodeCache,
    pub verifier: &'a VerificationPool,
    pub tag_size: usize,
}

impl Traversal<'_> {
    /// Mapping of every realization of `peptide` found in the indexed proteins.
    pub fn peptide_mapping(
        &self,
        peptide: &str,
        preferences: &SequenceMatchingPreferences,
    ) -> ProtreeResult<PeptideMapping> {
        if peptide.len() < self.tag_size {
            return Err(ProtreeError::PeptideTooShort {
                peptide: peptide.to_string(),
                min_length: self.tag_size,
            });
        }

        let seed_tag = peptide.get(..self.tag_size).ok_or_else(|| {
            ProtreeError::InvalidInput(format!("Peptide '{}' is not an amino acid sequence", peptide))
        })?;

        let mut mapping = PeptideMapping::new();
        for seed in expand_seed_tags(seed_tag, peptide.len(), preferences) {
            let tag = NodeRef::new(seed);
            if let Some(node) = self.nodes.get_node(&tag, self.store)? {
                let found = self.node_mapping(&tag, &node, peptide, preferences)?;
                merge_peptide_mappings(&mut mapping, found);
            }
        }
        Ok(mapping)
    }

    fn node_mapping(
        &self,
        tag: &NodeRef,
        node: &Node,
        peptide: &str,
        preferences: &SequenceMatchingPreferences,
    ) -> ProtreeResult<PeptideMapping> {
        let depth = node.depth();
        if depth == peptide.len() {
            if !preferences.allows_x_share(tag.as_str()) {
                return Ok(PeptideMapping::new());
            }
            let mapping = self.all_offsets(node)?;
            if mapping.is_empty() {
                return Ok(PeptideMapping::new());
            }
            return Ok(PeptideMapping::from([(tag.as_str().to_string(), mapping)]));
        }

        if let Some(candidates) = node.accessions() {
            trace!("Verifying {} candidates below {}", candidates.len(), tag);
            return self
                .verifier
                .verify(self.provider, candidates, peptide, preferences);
        }

        let mut mapping = PeptideMapping::new();
        let residue = peptide.as_bytes()[depth] as char;
        for accepted in acceptable_residues(residue, preferences) {
            let Some(child_tag) = node.child(accepted) else {
                continue;
            };
            let child = self.nodes.get_node(child_tag, self.store)?.ok_or_else(|| {
                ProtreeError::Corrupted(format!("Node {} references missing child {}", tag, child_tag))
            })?;
            let found = self.node_mapping(child_tag, &child, peptide, preferences)?;
            merge_peptide_mappings(&mut mapping, found);
        }
        Ok(mapping)
    }

    /// Every offset stored at or below a node, terminal ones included.
    fn all_offsets(&self, node: &Node) -> ProtreeResult<ProteinMapping> {
        let mut mapping = ProteinMapping::new();
        if let Some(accessions) = node.accessions() {
            for (accession, positions) in accessions {
                merge_protein_mappings(
                    &mut mapping,
                    ProteinMapping::from([(accession.clone(), positions.clone())]),
                );
            }
            return Ok(mapping);
        }

        for (accession, positions) in node.termini() {
            merge_protein_mappings(
                &mut mapping,
                ProteinMapping::from([(accession.clone(), positions.iter().copied().collect())]),
            );
        }
        if let Some(children) = node.children() {
            for child_tag in children.values() {
                let child = self.nodes.get_node(child_tag, self.store)?.ok_or_else(|| {
                    ProtreeError::Corrupted(format!("Missing child node {}", child_tag))
                })?;
                merge_protein_mappings(&mut mapping, self.all_offsets(&child)?);
            }
        }
        Ok(mapping)
    }
}
