//! Trie nodes
//!
//! A node is either a leaf holding accession -> offsets, or an internal node holding
//! one child reference per next residue. Children are stored under their own tag, so a
//! subtree can be evicted and reloaded without its parent.

use protree_bio::SequenceProvider;
use protree_core::{ProtreeError, ProtreeResult};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Store key of a node: the tag spelled by the path from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(String);

impl NodeRef {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference of the child reached through `residue`
    pub fn child(&self, residue: char) -> NodeRef {
        let mut tag = String::with_capacity(self.0.len() + 1);
        tag.push_str(&self.0);
        tag.push(residue);
        NodeRef(tag)
    }

    pub fn depth(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    depth: usize,
    accessions: Option<BTreeMap<String, Vec<usize>>>,
    termini: BTreeMap<String, BTreeSet<usize>>,
    children: Option<BTreeMap<char, NodeRef>>,
    /// Leaf: accession count. Internal: sum over children, fixed at split time.
    size: usize,
}

impl Node {
    /// Empty leaf at the given depth
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            accessions: Some(BTreeMap::new()),
            termini: BTreeMap::new(),
            children: None,
            size: 0,
        }
    }

    pub(crate) fn from_parts(
        depth: usize,
        accessions: Option<BTreeMap<String, Vec<usize>>>,
        termini: BTreeMap<String, BTreeSet<usize>>,
        children: Option<BTreeMap<char, NodeRef>>,
        size: usize,
    ) -> Self {
        Self {
            depth,
            accessions,
            termini,
            children,
            size,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.accessions.is_some()
    }

    pub fn accessions(&self) -> Option<&BTreeMap<String, Vec<usize>>> {
        self.accessions.as_ref()
    }

    pub fn termini(&self) -> &BTreeMap<String, BTreeSet<usize>> {
        &self.termini
    }

    pub fn children(&self) -> Option<&BTreeMap<char, NodeRef>> {
        self.children.as_ref()
    }

    pub fn child(&self, residue: char) -> Option<&NodeRef> {
        self.children.as_ref().and_then(|c| c.get(&residue))
    }

    /// Memory weight of the node in accession-count units
    pub fn size(&self) -> usize {
        self.size
    }

    /// Set the offsets of an accession, replacing previous ones.
    pub fn add_accession(&mut self, accession: String, positions: Vec<usize>) -> ProtreeResult<()> {
        let accessions = self.leaf_accessions_mut()?;
        accessions.insert(accession, positions);
        self.size = accessions.len();
        Ok(())
    }

    /// Append one offset to an accession.
    pub fn push_position(&mut self, accession: &str, position: usize) -> ProtreeResult<()> {
        let accessions = self.leaf_accessions_mut()?;
        match accessions.get_mut(accession) {
            Some(positions) => positions.push(position),
            None => {
                accessions.insert(accession.to_string(), vec![position]);
            }
        }
        self.size = accessions.len();
        Ok(())
    }

    fn leaf_accessions_mut(&mut self) -> ProtreeResult<&mut BTreeMap<String, Vec<usize>>> {
        self.accessions.as_mut().ok_or_else(|| {
            ProtreeError::InvalidInput(format!(
                "Cannot add accessions to a split node at depth {}",
                self.depth
            ))
        })
    }

    /// Split the node by the residue following its tag when it holds more than
    /// `max_node_size` accessions and its depth does not exceed `max_depth`.
    ///
    /// Offsets whose protein ends right after the tag become termini. Every descendant
    /// created (children are split recursively) is appended to `created` so the caller
    /// can persist it. Returns whether a split occurred.
    pub fn split_node<P: SequenceProvider + ?Sized>(
        &mut self,
        tag: &NodeRef,
        max_node_size: usize,
        max_depth: usize,
        provider: &P,
        created: &mut Vec<(NodeRef, Node)>,
    ) -> ProtreeResult<bool> {
        let oversized = self
            .accessions
            .as_ref()
            .is_some_and(|a| a.len() > max_node_size);
        if !oversized || self.depth > max_depth {
            return Ok(false);
        }
        let Some(accessions) = self.accessions.take() else {
            return Ok(false);
        };

        let mut grouped: BTreeMap<char, Node> = BTreeMap::new();
        let mut termini: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();

        for (accession, positions) in accessions {
            let sequence = provider.sequence(&accession)?;
            let residues = sequence.as_bytes();
            for position in positions {
                let index = position + self.depth;
                match index.cmp(&residues.len()) {
                    Ordering::Less => {
                        let residue = residues[index] as char;
                        grouped
                            .entry(residue)
                            .or_insert_with(|| Node::new(self.depth + 1))
                            .push_position(&accession, position)?;
                    }
                    Ordering::Equal => {
                        termini.entry(accession.clone()).or_default().insert(position);
                    }
                    Ordering::Greater => {
                        return Err(ProtreeError::TerminusOverrun { accession, index });
                    }
                }
            }
        }

        let mut children = BTreeMap::new();
        let mut size = 0;
        for (residue, mut child) in grouped {
            let child_ref = tag.child(residue);
            child.split_node(&child_ref, max_node_size, max_depth, provider, created)?;
            size += child.size();
            children.insert(residue, child_ref.clone());
            created.push((child_ref, child));
        }

        self.children = Some(children);
        self.termini = termini;
        self.size = size;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protree_bio::{FastaProteins, Protein};

    fn provider(proteins: &[(&str, &str)]) -> FastaProteins {
        FastaProteins::from_proteins(proteins.iter().map(|(a, s)| Protein::new(*a, *s))).unwrap()
    }

    #[test]
    fn test_leaf_accounting() {
        let mut node = Node::new(3);
        node.add_accession("P1".to_string(), vec![0, 4]).unwrap();
        node.push_position("P2", 1).unwrap();
        node.push_position("P2", 5).unwrap();
        // Last write wins
        node.add_accession("P1".to_string(), vec![2]).unwrap();

        assert!(node.is_leaf());
        assert_eq!(node.size(), 2);
        assert_eq!(node.accessions().unwrap()["P1"], vec![2]);
        assert_eq!(node.accessions().unwrap()["P2"], vec![1, 5]);
    }

    #[test]
    fn test_split_below_threshold_keeps_leaf() {
        let proteins = provider(&[("P1", "PEPTIDEK")]);
        let mut node = Node::new(3);
        node.add_accession("P1".to_string(), vec![0]).unwrap();

        let mut created = Vec::new();
        let split = node
            .split_node(&NodeRef::new("PEP"), 2, 60, &proteins, &mut created)
            .unwrap();

        assert!(!split);
        assert!(node.is_leaf());
        assert!(created.is_empty());
    }

    #[test]
    fn test_split_three_accessions_over_two() {
        let proteins = provider(&[("P1", "AKLM"), ("P2", "ARST"), ("P3", "AKVW")]);
        let mut node = Node::new(1);
        for accession in ["P1", "P2", "P3"] {
            node.add_accession(accession.to_string(), vec![0]).unwrap();
        }

        let mut created = Vec::new();
        let split = node
            .split_node(&NodeRef::new("A"), 2, 60, &proteins, &mut created)
            .unwrap();

        assert!(split);
        assert!(node.accessions().is_none());
        let children = node.children().unwrap();
        assert!(children.len() >= 2);
        assert_eq!(children[&'K'], NodeRef::new("AK"));
        assert_eq!(children[&'R'], NodeRef::new("AR"));
        assert_eq!(node.size(), 3);

        for (tag, child) in &created {
            assert_eq!(child.depth(), node.depth() + 1);
            assert_eq!(tag.depth(), child.depth());
        }
    }

    #[test]
    fn test_split_records_termini() {
        // "TID" ends P2, continues in P1 and P3
        let proteins = provider(&[("P1", "TIDEK"), ("P2", "AATID"), ("P3", "TIDA")]);
        let mut node = Node::new(3);
        node.add_accession("P1".to_string(), vec![0]).unwrap();
        node.add_accession("P2".to_string(), vec![2]).unwrap();
        node.add_accession("P3".to_string(), vec![0]).unwrap();

        let mut created = Vec::new();
        node.split_node(&NodeRef::new("TID"), 1, 60, &proteins, &mut created)
            .unwrap();

        assert_eq!(node.termini()["P2"], BTreeSet::from([2]));
        assert_eq!(node.children().unwrap().len(), 2);
        assert_eq!(node.size(), 2);
    }

    #[test]
    fn test_split_recurses_into_oversized_children() {
        let proteins = provider(&[("P1", "AKLM"), ("P2", "AKLN"), ("P3", "AKVW")]);
        let mut node = Node::new(1);
        for accession in ["P1", "P2", "P3"] {
            node.add_accession(accession.to_string(), vec![0]).unwrap();
        }

        let mut created = Vec::new();
        node.split_node(&NodeRef::new("A"), 2, 60, &proteins, &mut created)
            .unwrap();

        let tags: BTreeSet<&str> = created.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, BTreeSet::from(["AK", "AKL", "AKV"]));
        let ak = &created.iter().find(|(t, _)| t.as_str() == "AK").unwrap().1;
        assert!(!ak.is_leaf());
        assert_eq!(ak.size(), 3);
    }

    #[test]
    fn test_split_stops_at_max_depth() {
        let proteins = provider(&[("P1", "AAAA"), ("P2", "AAAC")]);
        let mut node = Node::new(3);
        node.add_accession("P1".to_string(), vec![0]).unwrap();
        node.add_accession("P2".to_string(), vec![0]).unwrap();

        let mut created = Vec::new();
        let split = node
            .split_node(&NodeRef::new("AAA"), 1, 2, &proteins, &mut created)
            .unwrap();
        assert!(!split);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_split_past_protein_end_is_an_error() {
        let proteins = provider(&[("P1", "AB"), ("P2", "ABC")]);
        let mut node = Node::new(3);
        node.add_accession("P1".to_string(), vec![0]).unwrap();
        node.add_accession("P2".to_string(), vec![0]).unwrap();

        let mut created = Vec::new();
        let result = node.split_node(&NodeRef::new("ABC"), 1, 60, &proteins, &mut created);
        assert!(matches!(
            result,
            Err(ProtreeError::TerminusOverrun { ref accession, index: 3 }) if accession == "P1"
        ));
    }

    #[test]
    fn test_cannot_add_to_internal_node() {
        let proteins = provider(&[("P1", "AKL"), ("P2", "ARL")]);
        let mut node = Node::new(1);
        node.add_accession("P1".to_string(), vec![0]).unwrap();
        node.add_accession("P2".to_string(), vec![0]).unwrap();
        node.split_node(&NodeRef::new("A"), 1, 60, &proteins, &mut Vec::new())
            .unwrap();

        assert!(matches!(
            node.push_position("P3", 0),
            Err(ProtreeError::InvalidInput(_))
        ));
    }
}
