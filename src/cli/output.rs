//! Rendering of query results

use colored::*;
use protree_core::{OutputFormat, PeptideMapping};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Mapping of one query peptide, ordered for stable output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeptideReport {
    pub peptide: String,
    /// Realized sequence -> accession -> offsets
    pub matches: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
}

impl PeptideReport {
    pub fn new(peptide: impl Into<String>, mapping: PeptideMapping) -> Self {
        let matches = mapping
            .into_iter()
            .map(|(sequence, proteins)| (sequence, proteins.into_iter().collect()))
            .collect();
        Self {
            peptide: peptide.into(),
            matches,
        }
    }

    /// Number of (protein, offset) hits over all realized sequences
    pub fn hit_count(&self) -> usize {
        self.matches
            .values()
            .flat_map(|proteins| proteins.values())
            .map(Vec::len)
            .sum()
    }
}

pub fn render(reports: &[PeptideReport], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)? + "\n"),
        OutputFormat::Tsv => Ok(render_tsv(reports)),
        OutputFormat::Text => Ok(render_text(reports)),
    }
}

fn render_tsv(reports: &[PeptideReport]) -> String {
    let mut out = String::from("peptide\tsequence\taccession\toffset\n");
    for report in reports {
        for (sequence, proteins) in &report.matches {
            for (accession, offsets) in proteins {
                for offset in offsets {
                    let _ = writeln!(
                        out,
                        "{}\t{}\t{}\t{}",
                        report.peptide, sequence, accession, offset
                    );
                }
            }
        }
    }
    out
}

fn render_text(reports: &[PeptideReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let hits = report.hit_count();
        let _ = writeln!(
            out,
            "{} {}",
            report.peptide.bold(),
            format!("({} hit{})", hits, if hits == 1 { "" } else { "s" }).dimmed()
        );
        if report.matches.is_empty() {
            let _ = writeln!(out, "  {}", "no matching protein".yellow());
            continue;
        }
        for (sequence, proteins) in &report.matches {
            let _ = writeln!(out, "  {}", sequence.cyan());
            for (accession, offsets) in proteins {
                let offsets: Vec<String> = offsets.iter().map(ToString::to_string).collect();
                let _ = writeln!(out, "    {:<20} {}", accession, offsets.join(", "));
            }
        }
    }
    out
}
