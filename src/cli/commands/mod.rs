pub mod clear;
pub mod index;
pub mod info;
pub mod map;

use anyhow::Context;
use protree_bio::{CleavageRule, Enzyme, FastaProteins, SequenceProvider};
use protree_core::Config;
use protree_index::{InitiateOutcome, ProteinTree, WaitingHandler};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use crate::cli::progress::{create_spinner, ProgressHandler};

/// Load a FASTA database and bind a tree to it, importing when no valid index exists.
pub(crate) fn open_tree(
    fasta: &Path,
    config: Config,
    quiet: bool,
) -> anyhow::Result<(ProteinTree, InitiateOutcome)> {
    let spinner = create_spinner(quiet, &format!("Loading {}...", fasta.display()));
    let provider: Arc<dyn SequenceProvider> = Arc::new(FastaProteins::open(fasta)?);
    spinner.finish_and_clear();

    let enzyme = config
        .import
        .enzyme
        .as_deref()
        .map(Enzyme::from_str)
        .transpose()?;

    let mut tree = ProteinTree::new(config)?;
    let handler = ProgressHandler::for_terminal(quiet, "Importing");
    let outcome = tree.initiate(
        provider,
        enzyme.as_ref().map(|e| e as &dyn CleavageRule),
        &handler,
    )?;
    handler.finish();
    Ok((tree, outcome))
}

pub(crate) fn last_modified(fasta: &Path) -> anyhow::Result<SystemTime> {
    let modified = std::fs::metadata(fasta)
        .and_then(|m| m.modified())
        .map_err(protree_core::ProtreeError::from)
        .with_context(|| format!("Cannot read {}", fasta.display()))?;
    Ok(modified)
}
