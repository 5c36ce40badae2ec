/// In-memory index store, used by tests and for throwaway indexes
use anyhow::Result;
use dashmap::DashMap;
use std::collections::HashSet;

use crate::core::{IndexStore, Table};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<(Table, String), Vec<u8>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a table
    pub fn len(&self, table: Table) -> usize {
        self.entries.iter().filter(|e| e.key().0 == table).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl IndexStore for InMemoryStore {
    fn put(&self, table: Table, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert((table, key.to_string()), value.to_vec());
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .get(&(table, key.to_string()))
            .map(|e| e.value().clone()))
    }

    fn keys(&self, table: Table) -> Result<HashSet<String>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().0 == table)
            .map(|e| e.key().1.clone())
            .collect())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn existed(&self) -> bool {
        false
    }
}
