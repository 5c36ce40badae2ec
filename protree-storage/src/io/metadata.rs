/// Typed access to the parameters and lengths tables
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{IndexStore, Table};

pub mod keys {
    pub const INITIAL_SIZE: &str = "initial_size";
    pub const IMPORT_COMPLETE: &str = "import_complete";
    pub const CORRUPTED: &str = "corrupted";
    pub const VERSION: &str = "version";
    pub const FASTA_PATH: &str = "fasta_path";
}

/// Scalar metadata stored alongside a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParameters {
    pub initial_tag_size: Option<usize>,
    pub import_complete: bool,
    pub corrupted: bool,
    pub version: Option<String>,
    pub fasta_path: Option<String>,
}

fn get_string<S: IndexStore + ?Sized>(store: &S, key: &str) -> Result<Option<String>> {
    match store.get(Table::Parameters, key)? {
        Some(bytes) => {
            let value = String::from_utf8(bytes)
                .with_context(|| format!("Parameter '{}' is not UTF-8", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn get_bool<S: IndexStore + ?Sized>(store: &S, key: &str) -> Result<bool> {
    match get_string(store, key)?.as_deref() {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(anyhow!("Parameter '{}' has invalid flag value '{}'", key, other)),
    }
}

pub fn read_parameters<S: IndexStore + ?Sized>(store: &S) -> Result<IndexParameters> {
    let initial_tag_size = match get_string(store, keys::INITIAL_SIZE)? {
        Some(value) => Some(
            value
                .parse::<usize>()
                .with_context(|| format!("Invalid initial tag size '{}'", value))?,
        ),
        None => None,
    };

    Ok(IndexParameters {
        initial_tag_size,
        import_complete: get_bool(store, keys::IMPORT_COMPLETE)?,
        corrupted: get_bool(store, keys::CORRUPTED)?,
        version: get_string(store, keys::VERSION)?,
        fasta_path: get_string(store, keys::FASTA_PATH)?,
    })
}

pub fn set_initial_tag_size<S: IndexStore + ?Sized>(store: &S, size: usize) -> Result<()> {
    store.put(Table::Parameters, keys::INITIAL_SIZE, size.to_string().as_bytes())
}

pub fn set_import_complete<S: IndexStore + ?Sized>(store: &S, complete: bool) -> Result<()> {
    store.put(
        Table::Parameters,
        keys::IMPORT_COMPLETE,
        complete.to_string().as_bytes(),
    )
}

pub fn set_corrupted<S: IndexStore + ?Sized>(store: &S, corrupted: bool) -> Result<()> {
    store.put(Table::Parameters, keys::CORRUPTED, corrupted.to_string().as_bytes())
}

pub fn set_version<S: IndexStore + ?Sized>(store: &S, version: &str) -> Result<()> {
    store.put(Table::Parameters, keys::VERSION, version.as_bytes())
}

pub fn set_fasta_path<S: IndexStore + ?Sized>(store: &S, path: &str) -> Result<()> {
    store.put(Table::Parameters, keys::FASTA_PATH, path.as_bytes())
}

/// Record protein lengths, keyed by accession
pub fn put_protein_lengths<S: IndexStore + ?Sized>(
    store: &S,
    lengths: &[(String, usize)],
) -> Result<()> {
    let entries: Vec<(String, Vec<u8>)> = lengths
        .iter()
        .map(|(accession, length)| (accession.clone(), (*length as u64).to_le_bytes().to_vec()))
        .collect();
    store.put_batch(Table::Lengths, &entries)
}

pub fn get_protein_length<S: IndexStore + ?Sized>(
    store: &S,
    accession: &str,
) -> Result<Option<usize>> {
    match store.get(Table::Lengths, accession)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| anyhow!("Invalid length entry for {}", accession))?;
            Ok(Some(u64::from_le_bytes(raw) as usize))
        }
        None => Ok(None),
    }
}
