//! Disk-backed protein tree
//!
//! Proteins are indexed by seed tags of fixed length. Each tag roots a trie whose nodes
//! are stored one per key, so queries only load the part of the tree they walk.

pub mod builder;
pub mod cache;
pub mod codec;
pub mod decoy;
pub mod iter;
pub mod matching;
pub mod node;
pub mod progress;
pub mod query;
pub mod result_cache;
pub mod tree;
pub mod verify;

pub use builder::{ImportSettings, ImportSummary, TreeBuilder};
pub use cache::{NodeCache, NodeCacheStats};
pub use iter::PeptideIterator;
pub use node::{Node, NodeRef};
pub use progress::{CancellationToken, SilentHandler, WaitingHandler};
pub use result_cache::{QueryCache, QueryCacheStats};
pub use tree::{delete_store, store_dir, InitiateOutcome, ProteinTree, StoreLocation};
pub use verify::VerificationPool;
