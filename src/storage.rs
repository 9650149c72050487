//! Table storage
//!
//! Loaded tables are replaced wholesale on every import. A store either swaps
//! in the complete new contents of a table or leaves the previous contents in
//! place; it never exposes a half-written table.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StorageError;
use crate::pipeline::processing::normalize::schema::Schema;
use crate::pipeline::processing::normalize::CleanRecord;

pub type SqlValue = rusqlite::types::Value;

/// Rows returned by a query, with column names in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in each row, in row order.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a SqlValue> + 'a {
        let index = self.column_index(column);
        self.rows.iter().filter_map(move |row| index.and_then(|i| row.get(i)))
    }
}

/// Render a value the way a terminal table shows it.
pub fn display_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(v) => v.to_string(),
        SqlValue::Real(v) => v.to_string(),
        SqlValue::Text(v) => v.clone(),
        SqlValue::Blob(v) => format!("<{} bytes>", v.len()),
    }
}

/// Storage trait for persisting cleaned tables
pub trait TableStore {
    /// Create the table if needed, then atomically replace its rows. Returns the stored row count.
    fn replace_table(&mut self, schema: &Schema, records: &[CleanRecord]) -> Result<usize, StorageError>;

    fn create_index(&mut self, table: &str, column: &str) -> Result<(), StorageError>;

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, StorageError>;

    fn row_count(&self, table: &str) -> Result<usize, StorageError>;
}

/// Table and column names are spliced into SQL, so only plain identifiers pass.
pub(crate) fn checked_identifier(name: &str) -> Result<&str, StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StorageError::Unsupported(format!("invalid identifier: {:?}", name)))
    }
}
