use clap::Args;
use colored::*;
use protree_core::Config;
use protree_index::delete_store;
use std::path::PathBuf;

use super::last_modified;

#[derive(Args)]
pub struct ClearArgs {
    /// Protein FASTA file whose index should be deleted
    #[arg(value_name = "FASTA")]
    pub fasta: PathBuf,
}

pub fn run(args: ClearArgs, config: Config) -> anyhow::Result<()> {
    if delete_store(&config, &args.fasta, last_modified(&args.fasta)?)? {
        println!(
            "{} Deleted index of {}",
            "✓".green().bold(),
            args.fasta.display()
        );
    } else {
        println!(
            "{} No index stored for {}",
            "○".dimmed(),
            args.fasta.display()
        );
    }
    Ok(())
}
