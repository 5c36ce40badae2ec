//! Test fixtures and data generators
//!
//! Protein sets for index and query tests, in memory or written as FASTA.

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use protree_bio::amino_acid::UNIQUE_AMINO_ACIDS;
use protree_bio::{FastaProteins, Protein};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Residues drawn for random proteins: the unique residues minus the rare U and O
const RANDOM_RESIDUES: [char; 20] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'Y',
    'V', 'W',
];

/// Builder for a small protein database
#[derive(Debug, Clone, Default)]
pub struct TestProteins {
    proteins: Vec<Protein>,
    decoys: bool,
}

impl TestProteins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, accession: &str, sequence: &str) -> Self {
        self.proteins.push(Protein::new(accession, sequence));
        self
    }

    /// Add `count` seeded random proteins named `R0`, `R1`, ...
    pub fn with_random(mut self, count: usize, length: usize, seed: u64) -> Self {
        self.proteins.extend(generate_proteins(count, length, seed));
        self
    }

    /// Add a reversed decoy for every protein when building
    pub fn with_decoys(mut self) -> Self {
        self.decoys = true;
        self
    }

    pub fn proteins(&self) -> &[Protein] {
        &self.proteins
    }

    /// All proteins, decoys included when requested
    pub fn all_proteins(&self) -> Vec<Protein> {
        let mut proteins = self.proteins.clone();
        if self.decoys {
            proteins.extend(self.proteins.iter().map(Protein::to_decoy));
        }
        proteins
    }

    /// In-memory sequence provider
    pub fn build(&self) -> Result<FastaProteins> {
        let provider = FastaProteins::from_proteins(self.proteins.clone())
            .context("Invalid test protein set")?;
        if self.decoys {
            return provider.with_decoys().context("Failed to add decoys");
        }
        Ok(provider)
    }

    pub fn fasta(&self) -> String {
        create_test_fasta(&self.all_proteins())
    }

    /// Write the database as FASTA, gzip compressed when the name ends in `.gz`.
    pub fn write_fasta(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        let content = self.fasta();
        if name.ends_with(".gz") {
            let file = std::fs::File::create(&path)?;
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(content.as_bytes())?;
            encoder.finish()?;
        } else {
            std::fs::write(&path, content)?;
        }
        Ok(path)
    }
}

/// Two proteins sharing TIDE at different offsets
pub fn sample_proteins() -> TestProteins {
    TestProteins::new()
        .with("P1", "PEPTIDEK")
        .with("P2", "TIDEKPEP")
}

/// Deterministic random proteins
pub fn generate_proteins(count: usize, length: usize, seed: u64) -> Vec<Protein> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let sequence: String = (0..length)
                .map(|_| RANDOM_RESIDUES[rng.gen_range(0..RANDOM_RESIDUES.len())])
                .collect();
            Protein::new(format!("R{}", i), sequence)
        })
        .collect()
}

/// Random peptides cut from the given proteins, with their source
pub fn sample_peptides(
    proteins: &[Protein],
    count: usize,
    length: usize,
    seed: u64,
) -> Vec<(String, String, usize)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let usable: Vec<&Protein> = proteins.iter().filter(|p| p.len() >= length).collect();
    if usable.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            let protein = usable[rng.gen_range(0..usable.len())];
            let start = rng.gen_range(0..=protein.len() - length);
            (
                protein.sequence[start..start + length].to_string(),
                protein.accession.clone(),
                start,
            )
        })
        .collect()
}

/// FASTA text for a set of proteins, 60 residues per line
pub fn create_test_fasta(proteins: &[Protein]) -> String {
    let mut fasta = String::new();
    for protein in proteins {
        let _ = writeln!(fasta, "{}", protein.header());
        for line in protein.sequence.as_bytes().chunks(60) {
            fasta.push_str(&String::from_utf8_lossy(line));
            fasta.push('\n');
        }
    }
    fasta
}

/// Whether every residue of a generated protein is a plain residue
pub fn is_plain_protein(protein: &Protein) -> bool {
    protein
        .sequence
        .chars()
        .all(|c| UNIQUE_AMINO_ACIDS.contains(&c))
}
