//! Binary encoding of tree nodes for the nodes table
//!
//! Children are stored as the residues leading to them; the child tag is rebuilt from
//! the key the node was read under.

use protree_core::{ProtreeError, ProtreeResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::node::{Node, NodeRef};

pub const NODE_FORMAT_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
enum NodeRecord {
    Leaf {
        depth: usize,
        accessions: BTreeMap<String, Vec<usize>>,
    },
    Internal {
        depth: usize,
        size: usize,
        termini: BTreeMap<String, BTreeSet<usize>>,
        children: Vec<char>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeEnvelope {
    format_version: u8,
    record: NodeRecord,
}

pub fn encode_node(node: &Node) -> ProtreeResult<Vec<u8>> {
    let record = match (node.accessions(), node.children()) {
        (Some(accessions), None) => NodeRecord::Leaf {
            depth: node.depth(),
            accessions: accessions.clone(),
        },
        (None, Some(children)) => NodeRecord::Internal {
            depth: node.depth(),
            size: node.size(),
            termini: node.termini().clone(),
            children: children.keys().copied().collect(),
        },
        _ => {
            return Err(ProtreeError::Corrupted(format!(
                "Node at depth {} is neither leaf nor internal",
                node.depth()
            )))
        }
    };

    let envelope = NodeEnvelope {
        format_version: NODE_FORMAT_VERSION,
        record,
    };
    Ok(bincode::serialize(&envelope)?)
}

/// Decode the node stored under `tag`.
pub fn decode_node(tag: &NodeRef, bytes: &[u8]) -> ProtreeResult<Node> {
    let envelope: NodeEnvelope = bincode::deserialize(bytes)
        .map_err(|e| ProtreeError::Corrupted(format!("Undecodable node '{}': {}", tag, e)))?;

    if envelope.format_version != NODE_FORMAT_VERSION {
        return Err(ProtreeError::Version(format!(
            "Node '{}' has format version {}, expected {}",
            tag, envelope.format_version, NODE_FORMAT_VERSION
        )));
    }

    let node = match envelope.record {
        NodeRecord::Leaf { depth, accessions } => {
            let size = accessions.len();
            Node::from_parts(depth, Some(accessions), BTreeMap::new(), None, size)
        }
        NodeRecord::Internal {
            depth,
            size,
            termini,
            children,
        } => {
            let children = children
                .into_iter()
                .map(|residue| (residue, tag.child(residue)))
                .collect();
            Node::from_parts(depth, None, termini, Some(children), size)
        }
    };

    if node.depth() != tag.depth() {
        return Err(ProtreeError::Corrupted(format!(
            "Node '{}' stored at depth {}",
            tag,
            node.depth()
        )));
    }
    Ok(node)
}
