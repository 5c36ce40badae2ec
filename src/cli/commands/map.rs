use anyhow::Context;
use clap::Args;
use protree_core::{
    Config, MatchingMode, OutputFormat, ProtreeError, SequenceMatchingPreferences,
};
use std::path::PathBuf;

use super::open_tree;
use crate::cli::output::{render, PeptideReport};

#[derive(Args)]
pub struct MapArgs {
    /// Protein FASTA file (optionally gzip compressed)
    #[arg(value_name = "FASTA")]
    pub fasta: PathBuf,

    /// Peptides to map
    #[arg(value_name = "PEPTIDE")]
    pub peptides: Vec<String>,

    /// Read additional peptides from a file, one per line
    #[arg(short, long, value_name = "FILE")]
    pub peptide_file: Option<PathBuf>,

    /// How residues are compared
    #[arg(short, long, value_enum, default_value_t = MatchingMode::Exact)]
    pub mode: MatchingMode,

    /// Mass tolerance in Da for mass tolerant matching
    #[arg(long, default_value_t = 0.02)]
    pub tolerance: f64,

    /// Largest share of X residues a match may contain (0.0 - 1.0)
    #[arg(long, value_name = "SHARE")]
    pub limit_x: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl MapArgs {
    fn preferences(&self) -> anyhow::Result<SequenceMatchingPreferences> {
        let preferences = match self.mode {
            MatchingMode::Exact => SequenceMatchingPreferences::exact(),
            MatchingMode::Combinatorial => SequenceMatchingPreferences::combinatorial(),
            MatchingMode::MassTolerant => SequenceMatchingPreferences::mass_tolerant(self.tolerance),
        };
        match self.limit_x {
            Some(share) if !(0.0..=1.0).contains(&share) => Err(ProtreeError::InvalidInput(
                format!("--limit-x must be between 0 and 1, got {}", share),
            )
            .into()),
            Some(share) => Ok(preferences.with_limit_x(share)),
            None => Ok(preferences),
        }
    }

    fn all_peptides(&self) -> anyhow::Result<Vec<String>> {
        let mut peptides = self.peptides.clone();
        if let Some(path) = &self.peptide_file {
            let contents = std::fs::read_to_string(path)
                .map_err(ProtreeError::from)
                .with_context(|| format!("Cannot read peptides from {}", path.display()))?;
            peptides.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_string),
            );
        }
        if peptides.is_empty() {
            return Err(ProtreeError::InvalidInput("No peptides given".to_string()).into());
        }
        Ok(peptides)
    }
}

pub fn run(args: MapArgs, config: Config, quiet: bool) -> anyhow::Result<()> {
    let peptides = args.all_peptides()?;
    let preferences = args.preferences()?;
    let (tree, _) = open_tree(&args.fasta, config, quiet || args.format.is_machine_readable())?;

    let mut reports = Vec::with_capacity(peptides.len());
    for peptide in peptides {
        let mapping = tree.get_protein_mapping(&peptide, &preferences)?;
        reports.push(PeptideReport::new(peptide.to_ascii_uppercase(), mapping));
    }

    print!("{}", render(&reports, args.format)?);
    Ok(())
}
