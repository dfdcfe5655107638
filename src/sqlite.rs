//! SQLite-backed query engine.
//!
//! Opens database files read-only, so even a query that slipped past the gate
//! could not modify them. Also reads the schema of the opened database.

use crate::engine::{ColumnInfo, QueryEngine, QueryResult};
use crate::error::GateError;
use crate::schema::{Column, Schema};
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Number, Value};
use std::path::Path;
use tracing::debug;

/// Query engine over a single SQLite connection.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
    row_limit: Option<usize>,
}

impl SqliteEngine {
    /// Open an existing database file read-only.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "Opened SQLite database read-only");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            row_limit: None,
        }
    }

    /// Stop fetching after `limit` rows plus one, so callers can tell the
    /// result was cut short.
    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Read table names and their ordered columns.
    pub fn schema(&self) -> Result<Schema, GateError> {
        let conn = self.conn.lock();
        let mut tables = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = tables
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut columns = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let mut schema = Schema::new();
        for name in names {
            let cols = columns
                .query_map([&name], |row| {
                    Ok(Column::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            schema.insert_table(name, cols);
        }
        Ok(schema)
    }
}

impl QueryEngine for SqliteEngine {
    fn execute(&self, sql: &str) -> Result<QueryResult, GateError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
        let mut kinds: Vec<Option<&'static str>> = vec![None; names.len()];

        let fetch_limit = self.row_limit.map(|limit| limit.saturating_add(1));
        let mut rows_iter = stmt.query([])?;
        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next()? {
            if fetch_limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
            let mut values = Vec::with_capacity(names.len());
            for (idx, kind) in kinds.iter_mut().enumerate() {
                let value = row.get_ref(idx)?;
                if kind.is_none() {
                    *kind = storage_class(value);
                }
                values.push(to_json(value)?);
            }
            rows.push(values);
        }

        let columns = names
            .into_iter()
            .zip(kinds)
            .map(|(name, kind)| ColumnInfo::new(name, kind.unwrap_or("NULL")))
            .collect();
        Ok(QueryResult::new(columns, rows))
    }
}

/// SQLite storage class of a non-null value.
fn storage_class(value: ValueRef<'_>) -> Option<&'static str> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(_) => Some("INTEGER"),
        ValueRef::Real(_) => Some("REAL"),
        ValueRef::Text(_) => Some("TEXT"),
        ValueRef::Blob(_) => Some("BLOB"),
    }
}

fn to_json(value: ValueRef<'_>) -> Result<Value, GateError> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        ValueRef::Real(f) => Ok(Number::from_f64(f).map_or(Value::Null, Value::Number)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| GateError::internal(format!("SQLite text decode failed: {}", e))),
        ValueRef::Blob(bytes) => Ok(Value::String(format!("<{} bytes>", bytes.len()))),
    }
}
