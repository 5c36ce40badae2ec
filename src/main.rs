use clap::Parser;
use colored::*;
use protree::cli::{commands, Cli, Commands};
use protree::ProtreeError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        let exit_code = e
            .downcast_ref::<ProtreeError>()
            .map_or(1, ProtreeError::exit_code);
        process::exit(exit_code);
    }
}

/// RUST_LOG wins, then PROTREE_LOG, then the verbosity flag.
fn init_logging(verbose: u8) {
    let fallback = std::env::var("PROTREE_LOG").unwrap_or_else(|_| {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Index(args) => commands::index::run(args, config, quiet),
        Commands::Map(args) => commands::map::run(args, config, quiet),
        Commands::Info(args) => commands::info::run(args, config),
        Commands::Clear(args) => commands::clear::run(args, config),
    }
}
