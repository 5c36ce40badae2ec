use clap::Args;
use colored::*;
use protree_core::Config;
use protree_index::{delete_store, InitiateOutcome, StoreLocation};
use std::path::PathBuf;
use tracing::info;

use super::{last_modified, open_tree};

#[derive(Args)]
pub struct IndexArgs {
    /// Protein FASTA file (optionally gzip compressed)
    #[arg(value_name = "FASTA")]
    pub fasta: PathBuf,

    /// Seed tag length
    #[arg(short = 'k', long)]
    pub tag_size: Option<usize>,

    /// Only start seed tags at cleavage sites (trypsin, lys-c, arg-c)
    #[arg(short, long)]
    pub enzyme: Option<String>,

    /// Delete the stored index and import again
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: IndexArgs, mut config: Config, quiet: bool) -> anyhow::Result<()> {
    if let Some(tag_size) = args.tag_size {
        config.tree.initial_tag_size = tag_size;
    }
    if args.enzyme.is_some() {
        config.import.enzyme = args.enzyme;
    }
    config.validate()?;

    if args.force && delete_store(&config, &args.fasta, last_modified(&args.fasta)?)? {
        info!("Deleted stored index of {}", args.fasta.display());
    }

    let (tree, outcome) = open_tree(&args.fasta, config, quiet)?;
    match outcome {
        InitiateOutcome::Reused => {
            println!("{} Index is current", "✓".green().bold());
        }
        InitiateOutcome::Imported(summary) => {
            println!(
                "{} Indexed {} proteins: {} nodes under {} seed tags ({} pass{})",
                "✓".green().bold(),
                summary.proteins,
                summary.nodes_written,
                summary.tags_with_data,
                summary.passes,
                if summary.passes == 1 { "" } else { "es" }
            );
        }
    }
    if let Some(StoreLocation::Disk(path)) = tree.store_location() {
        println!("  {} {}", "Store:".dimmed(), path.display());
    }
    Ok(())
}
