//! Walk over the branch ends of a stored tree
//!
//! Leaves yield their accessions. Internal nodes yield their termini, the proteins that
//! end right after the node's tag, before any of their children.

use protree_core::{ProteinMapping, ProtreeError, ProtreeResult};
use protree_storage::IndexStore;
use std::sync::Arc;

use crate::builder::enumerate_tags;
use crate::cache::NodeCache;
use crate::node::{Node, NodeRef};

enum Pending {
    /// Most seed tags are absent from the store
    Seed(NodeRef),
    Child(NodeRef),
    Termini(NodeRef, Arc<Node>),
}

/// Alphabetical iterator over `(tag, accession -> offsets)` pairs.
///
/// Nodes are loaded through the node cache, so a full walk respects the memory budget.
/// The iterator stops after the first error.
pub struct PeptideIterator<'a> {
    store: &'a dyn IndexStore,
    nodes: &'a NodeCache,
    seeds: std::vec::IntoIter<String>,
    pending: Vec<Pending>,
    failed: bool,
}

impl<'a> PeptideIterator<'a> {
    pub fn new(store: &'a dyn IndexStore, nodes: &'a NodeCache, tag_size: usize) -> Self {
        let mut seeds = enumerate_tags(tag_size);
        seeds.sort_unstable();
        Self {
            store,
            nodes,
            seeds: seeds.into_iter(),
            pending: Vec::new(),
            failed: false,
        }
    }

    fn step(&mut self, pending: Pending) -> ProtreeResult<Option<(String, ProteinMapping)>> {
        let (tag, node, is_seed) = match pending {
            Pending::Termini(tag, node) => {
                let mapping = node
                    .termini()
                    .iter()
                    .map(|(accession, positions)| {
                        (accession.clone(), positions.iter().copied().collect())
                    })
                    .collect();
                return Ok(Some((tag.as_str().to_string(), mapping)));
            }
            Pending::Seed(tag) => {
                let node = self.nodes.get_node(&tag, self.store)?;
                (tag, node, true)
            }
            Pending::Child(tag) => {
                let node = self.nodes.get_node(&tag, self.store)?;
                (tag, node, false)
            }
        };

        let Some(node) = node else {
            if is_seed {
                return Ok(None);
            }
            return Err(ProtreeError::Corrupted(format!(
                "Child node {} is missing from the store",
                tag
            )));
        };

        if let Some(accessions) = node.accessions() {
            if accessions.is_empty() {
                return Ok(None);
            }
            let mapping = accessions
                .iter()
                .map(|(accession, positions)| (accession.clone(), positions.clone()))
                .collect();
            return Ok(Some((tag.as_str().to_string(), mapping)));
        }

        if let Some(children) = node.children() {
            for child in children.values().rev() {
                self.pending.push(Pending::Child(child.clone()));
            }
        }
        if !node.termini().is_empty() {
            self.pending.push(Pending::Termini(tag, node));
        }
        Ok(None)
    }
}

impl Iterator for PeptideIterator<'_> {
    type Item = ProtreeResult<(String, ProteinMapping)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let pending = match self.pending.pop() {
                Some(pending) => pending,
                None => Pending::Seed(NodeRef::new(self.seeds.next()?)),
            };
            match self.step(pending) {
                Ok(Some(item)) => return Some(Ok(item)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
