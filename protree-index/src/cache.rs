//! Bounded set of tree nodes resident in memory
//!
//! Nodes are weighted by [`Node::size`]. Eviction follows the order in which nodes were
//! loaded from the store: a hit does not move a node, so the oldest load is evicted
//! first even if it was read a moment ago.

use parking_lot::Mutex;
use protree_core::{ProtreeError, ProtreeResult};
use protree_storage::{IndexStore, Table};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::codec::decode_node;
use crate::node::{Node, NodeRef};

#[derive(Debug)]
pub struct NodeCache {
    inner: Mutex<InnerCache>,
}

#[derive(Debug, Default)]
struct InnerCache {
    nodes: HashMap<NodeRef, Arc<Node>>,
    /// Front = most recently loaded
    load_order: VecDeque<NodeRef>,
    footprint: usize,
    budget: usize,
    hit_count: u64,
    miss_count: u64,
    eviction_count: u64,
}

/// Counters of a node cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeCacheStats {
    pub resident: usize,
    pub footprint: usize,
    pub budget: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl InnerCache {
    fn evict_over_budget(&mut self) {
        while self.footprint > self.budget {
            let Some(tag) = self.load_order.pop_back() else {
                break;
            };
            self.remove(&tag);
        }
    }

    fn remove(&mut self, tag: &NodeRef) {
        if let Some(node) = self.nodes.remove(tag) {
            self.footprint = self.footprint.saturating_sub(node.size());
            self.eviction_count += 1;
        }
    }
}

impl NodeCache {
    /// Create a cache holding at most `budget` accession-count units
    pub fn new(budget: usize) -> Self {
        Self {
            inner: Mutex::new(InnerCache {
                budget,
                ..Default::default()
            }),
        }
    }

    /// Resident node for `tag`, loading it from `store` on a miss.
    ///
    /// Returns `None` when the store has no such tag. A node larger than the whole
    /// budget is returned but does not stay resident.
    pub fn get_node<S: IndexStore + ?Sized>(
        &self,
        tag: &NodeRef,
        store: &S,
    ) -> ProtreeResult<Option<Arc<Node>>> {
        {
            let mut cache = self.inner.lock();
            if let Some(node) = cache.nodes.get(tag).cloned() {
                cache.hit_count += 1;
                return Ok(Some(node));
            }
            cache.miss_count += 1;
        }

        // Load without holding the lock; concurrent loads of one tag are resolved below
        let Some(bytes) = store
            .get(Table::Nodes, tag.as_str())
            .map_err(ProtreeError::from)?
        else {
            return Ok(None);
        };
        let node = Arc::new(decode_node(tag, &bytes)?);

        let mut cache = self.inner.lock();
        if let Some(existing) = cache.nodes.get(tag).cloned() {
            return Ok(Some(existing));
        }
        cache.footprint += node.size();
        cache.nodes.insert(tag.clone(), Arc::clone(&node));
        cache.load_order.push_front(tag.clone());
        cache.evict_over_budget();
        debug!(
            "Loaded node {} (size {}), footprint {}/{}",
            tag,
            node.size(),
            cache.footprint,
            cache.budget
        );
        Ok(Some(node))
    }

    /// Evict the oldest `share` (0.0 - 1.0) of resident nodes.
    pub fn reduce(&self, share: f64) -> ProtreeResult<()> {
        if !(0.0..=1.0).contains(&share) {
            return Err(ProtreeError::InvalidInput(format!(
                "Node cache share must be between 0 and 1, got {}",
                share
            )));
        }
        let mut cache = self.inner.lock();
        let count = (cache.load_order.len() as f64 * share).round() as usize;
        for _ in 0..count {
            let Some(tag) = cache.load_order.pop_back() else {
                break;
            };
            cache.remove(&tag);
        }
        Ok(())
    }

    /// Drop every resident node
    pub fn empty(&self) {
        let mut cache = self.inner.lock();
        cache.nodes.clear();
        cache.load_order.clear();
        cache.footprint = 0;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().nodes.is_empty()
    }

    /// Sum of resident node sizes
    pub fn footprint(&self) -> usize {
        self.inner.lock().footprint
    }

    pub fn contains(&self, tag: &NodeRef) -> bool {
        self.inner.lock().nodes.contains_key(tag)
    }

    pub fn stats(&self) -> NodeCacheStats {
        let cache = self.inner.lock();
        NodeCacheStats {
            resident: cache.nodes.len(),
            footprint: cache.footprint,
            budget: cache.budget,
            hits: cache.hit_count,
            misses: cache.miss_count,
            evictions: cache.eviction_count,
        }
    }
}
