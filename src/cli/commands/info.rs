use clap::Args;
use colored::*;
use protree_core::{Config, OutputFormat};
use protree_index::store_dir;
use protree_storage::{read_parameters, IndexStore, RocksDBBackend, RocksDBConfig, Table};
use serde::Serialize;
use std::path::PathBuf;

use super::last_modified;

#[derive(Args)]
pub struct InfoArgs {
    /// Protein FASTA file the index was built from
    #[arg(value_name = "FASTA")]
    pub fasta: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct IndexInfo {
    store: PathBuf,
    exists: bool,
    initial_tag_size: Option<usize>,
    import_complete: bool,
    corrupted: bool,
    version: Option<String>,
    fasta_path: Option<String>,
    nodes: usize,
    proteins: usize,
}

pub fn run(args: InfoArgs, config: Config) -> anyhow::Result<()> {
    let path = store_dir(&config, &args.fasta, last_modified(&args.fasta)?);
    let mut info = IndexInfo {
        store: path.clone(),
        exists: RocksDBBackend::store_exists(&path),
        initial_tag_size: None,
        import_complete: false,
        corrupted: false,
        version: None,
        fasta_path: None,
        nodes: 0,
        proteins: 0,
    };

    if info.exists {
        let store =
            RocksDBBackend::with_config(RocksDBConfig::from_storage_config(&path, &config.storage))?;
        let params = read_parameters(&store)?;
        info.initial_tag_size = params.initial_tag_size;
        info.import_complete = params.import_complete;
        info.corrupted = params.corrupted;
        info.version = params.version;
        info.fasta_path = params.fasta_path;
        info.nodes = store.keys(Table::Nodes)?.len();
        info.proteins = store.keys(Table::Lengths)?.len();
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Tsv => {
            println!("key\tvalue");
            for (key, value) in rows(&info) {
                println!("{}\t{}", key, value);
            }
        }
        OutputFormat::Text => print_text(&info),
    }
    Ok(())
}

fn rows(info: &IndexInfo) -> Vec<(&'static str, String)> {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    vec![
        ("store", info.store.display().to_string()),
        ("exists", info.exists.to_string()),
        ("initial_tag_size", optional(info.initial_tag_size.map(|s| s.to_string()))),
        ("import_complete", info.import_complete.to_string()),
        ("corrupted", info.corrupted.to_string()),
        ("version", optional(info.version.clone())),
        ("fasta_path", optional(info.fasta_path.clone())),
        ("nodes", info.nodes.to_string()),
        ("proteins", info.proteins.to_string()),
    ]
}

fn print_text(info: &IndexInfo) {
    if !info.exists {
        println!(
            "{} No index stored at {}",
            "○".dimmed(),
            info.store.display()
        );
        return;
    }

    let status = if info.corrupted {
        "corrupted".red().bold()
    } else if info.import_complete {
        "complete".green().bold()
    } else {
        "incomplete".yellow().bold()
    };
    println!("{} {}", "Index".bold(), status);
    for (key, value) in rows(info) {
        if key == "exists" {
            continue;
        }
        println!("  {:<18} {}", format!("{}:", key).dimmed(), value);
    }
}
