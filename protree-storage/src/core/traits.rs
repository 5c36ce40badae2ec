//! Persistent store abstraction the protein tree is written to

use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Logical tables of an index store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Tag -> encoded tree node
    Nodes,
    /// Scalar index metadata
    Parameters,
    /// Accession -> protein length
    Lengths,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Nodes, Table::Parameters, Table::Lengths];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Nodes => "nodes",
            Table::Parameters => "parameters",
            Table::Lengths => "lengths",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key-value store with a fixed set of tables.
///
/// Writes are single-writer during import; reads may come from any thread afterwards.
pub trait IndexStore: Send + Sync {
    /// Insert or overwrite a value
    fn put(&self, table: Table, key: &str, value: &[u8]) -> Result<()>;

    /// Insert several values of one table at once
    fn put_batch(&self, table: Table, entries: &[(String, Vec<u8>)]) -> Result<()> {
        for (key, value) in entries {
            self.put(table, key, value)?;
        }
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>>;

    fn contains(&self, table: Table, key: &str) -> Result<bool> {
        Ok(self.get(table, key)?.is_some())
    }

    /// All keys of a table
    fn keys(&self, table: Table) -> Result<HashSet<String>>;

    /// Persist pending writes
    fn flush(&self) -> Result<()>;

    /// Reclaim space after bulk writes
    fn compact(&self) -> Result<()> {
        Ok(())
    }

    /// Whether the store already held data when it was opened
    fn existed(&self) -> bool;

    /// Directory backing the store, if any
    fn path(&self) -> Option<&Path> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_distinct() {
        let names: HashSet<&str> = Table::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), Table::ALL.len());
        assert_eq!(Table::Nodes.to_string(), "nodes");
    }
}
