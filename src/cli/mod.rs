pub mod commands;
pub mod output;
pub mod progress;

use clap::{Parser, Subcommand};
use protree_core::system::config_path;
use protree_core::{load_config, Config, ProtreeResult};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "protree",
    version,
    about = "Map peptides to the proteins of a FASTA database",
    long_about = "protree indexes a protein FASTA file into a disk-backed tree of seed tags and \
                  maps peptides to every protein and offset where they occur, optionally allowing \
                  ambiguous and mass-indistinguishable residues."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of import and verification threads (0 = all available)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,

    /// Configuration file [default: $PROTREE_HOME/config.toml when present]
    #[arg(short, long, global = true, env = "PROTREE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding index stores
    #[arg(long, global = true, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the index of a FASTA file, or check that the stored one is current
    Index(commands::index::IndexArgs),

    /// Map peptides to the proteins of a FASTA file
    Map(commands::map::MapArgs),

    /// Show the stored parameters of an index
    Info(commands::info::InfoArgs),

    /// Delete the stored index of a FASTA file
    Clear(commands::clear::ClearArgs),
}

impl Cli {
    /// Configuration file merged with the global flags
    pub fn load_config(&self) -> ProtreeResult<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => {
                let default_path = config_path();
                if default_path.is_file() {
                    load_config(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(threads) = self.threads {
            config.import.threads = threads;
            config.verification.threads = threads;
        }
        if let Some(dir) = &self.index_dir {
            config.storage.index_dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}
