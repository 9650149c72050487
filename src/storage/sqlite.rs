use rusqlite::types::ToSqlOutput;
use rusqlite::{params_from_iter, Connection, OpenFlags, ToSql};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{checked_identifier, QueryResult, SqlValue, TableStore};
use crate::error::StorageError;
use crate::pipeline::processing::normalize::schema::Schema;
use crate::pipeline::processing::normalize::{CleanRecord, FieldValue};

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FieldValue::Integer(v) => Ok(ToSqlOutput::from(*v)),
            FieldValue::Text(v) => Ok(ToSqlOutput::from(v.as_str())),
        }
    }
}

/// SQLite-backed store. Open one per import or query run and drop it afterwards.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Unavailable(format!("{}: {}", parent.display(), e)))?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Connected to database: {}", db_path.display());
        Ok(Self {
            conn,
            path: Some(db_path.to_path_buf()),
        })
    }

    /// Open a database that an import already created. Nothing is created on disk.
    pub fn open_existing<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            return Err(StorageError::Unavailable(format!(
                "database not found: {} (run import first)",
                db_path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
        )?;
        debug!("Opened existing database: {}", db_path.display());
        Ok(Self {
            conn,
            path: Some(db_path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn create_table_sql(schema: &Schema) -> Result<String, StorageError> {
        let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for field in schema.fields {
            let not_null = if field.required { " NOT NULL" } else { "" };
            columns.push(format!("{} {}{}", checked_identifier(field.name)?, field.sql_type(), not_null));
        }
        columns.push("created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP".to_string());
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            checked_identifier(schema.table)?,
            columns.join(",\n    ")
        ))
    }

    fn insert_sql(schema: &Schema) -> Result<String, StorageError> {
        let names = schema
            .fields
            .iter()
            .map(|f| checked_identifier(f.name))
            .collect::<Result<Vec<_>, _>>()?;
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            checked_identifier(schema.table)?,
            names.join(", "),
            placeholders.join(", ")
        ))
    }
}

impl TableStore for SqliteStore {
    fn replace_table(&mut self, schema: &Schema, records: &[CleanRecord]) -> Result<usize, StorageError> {
        let create_sql = Self::create_table_sql(schema)?;
        let insert_sql = Self::insert_sql(schema)?;

        // Dropping the transaction without commit rolls back, leaving the old rows
        let tx = self.conn.transaction()?;
        tx.execute_batch(&create_sql)?;
        tx.execute(&format!("DELETE FROM {}", schema.table), [])?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for record in records {
                stmt.execute(params_from_iter(record.values()))?;
            }
        }
        tx.commit()?;

        let count = self.row_count(schema.table)?;
        debug!("Replaced {} with {} rows", schema.table, count);
        Ok(count)
    }

    fn create_index(&mut self, table: &str, column: &str) -> Result<(), StorageError> {
        let table = checked_identifier(table)?;
        let column = checked_identifier(column)?;
        self.conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column})"
        ))?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width).map(|i| row.get::<_, SqlValue>(i)).collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(QueryResult { columns, rows })
    }

    fn row_count(&self, table: &str) -> Result<usize, StorageError> {
        let table = checked_identifier(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
