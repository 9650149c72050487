use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::{QueryResult, SqlValue, TableStore};
use crate::error::StorageError;
use crate::pipeline::processing::normalize::schema::Schema;
use crate::pipeline::processing::normalize::CleanRecord;

/// In-memory storage implementation for dry runs and testing
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: HashMap<String, Vec<CleanRecord>>,
    indexes: HashSet<(String, String)>,
    unavailable: HashSet<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `table` fail as if the backing store were down.
    pub fn fail_writes_to(&mut self, table: &str) {
        self.unavailable.insert(table.to_string());
    }

    pub fn records(&self, table: &str) -> Option<&[CleanRecord]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn has_index(&self, table: &str, column: &str) -> bool {
        self.indexes.contains(&(table.to_string(), column.to_string()))
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl TableStore for InMemoryStore {
    fn replace_table(&mut self, schema: &Schema, records: &[CleanRecord]) -> Result<usize, StorageError> {
        if self.unavailable.contains(schema.table) {
            return Err(StorageError::Unavailable(format!("writes to {} are failing", schema.table)));
        }
        self.tables.insert(schema.table.to_string(), records.to_vec());
        debug!("Stored {} rows in {}", records.len(), schema.table);
        Ok(records.len())
    }

    fn create_index(&mut self, table: &str, column: &str) -> Result<(), StorageError> {
        if !self.tables.contains_key(table) {
            return Err(StorageError::Unavailable(format!("no such table: {}", table)));
        }
        self.indexes.insert((table.to_string(), column.to_string()));
        Ok(())
    }

    fn query(&self, sql: &str, _params: &[SqlValue]) -> Result<QueryResult, StorageError> {
        Err(StorageError::Unsupported(format!("SQL queries on the in-memory store: {}", sql)))
    }

    fn row_count(&self, table: &str) -> Result<usize, StorageError> {
        Ok(self.tables.get(table).map(Vec::len).unwrap_or(0))
    }
}
