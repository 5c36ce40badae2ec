//! protree: disk-backed protein tree for peptide to protein mapping
//!
//! The library side of the binary. Index building and queries live in `protree-index`;
//! this crate adds the command line front end.

pub mod cli;

pub use protree_core::{Config, ProtreeError, ProtreeResult};
pub use protree_index::ProteinTree;
