//! Schema description supplied by the data loader.
//!
//! The gate does not consult the schema when validating; it is carried here
//! so callers can hand the model an accurate picture of the loaded tables.

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A single column of a loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Engine type name (e.g. `INTEGER`, `VARCHAR`).
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Mapping from table name to its ordered columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: BTreeMap<String, Vec<Column>>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema from JSON of the form
    /// `{"table": [{"name": "id", "type": "INTEGER"}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self, GateError> {
        let schema: Self = serde_json::from_str(json)?;
        if let Some((table, _)) = schema.tables.iter().find(|(name, _)| name.trim().is_empty()) {
            return Err(GateError::invalid_input(format!(
                "Table name cannot be empty (got {:?})",
                table
            )));
        }
        Ok(schema)
    }

    /// Load a schema from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Add or replace a table.
    pub fn insert_table(&mut self, name: impl Into<String>, columns: Vec<Column>) {
        self.tables.insert(name.into(), columns);
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Columns of a table, if it exists.
    pub fn columns(&self, table: &str) -> Option<&[Column]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Check whether no tables are loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render the schema as plain text for a model prompt.
    ///
    /// ```text
    /// Table: sales
    ///   - id (INTEGER)
    ///   - amount (DOUBLE)
    /// ```
    pub fn describe(&self) -> String {
        if self.tables.is_empty() {
            return "No tables loaded.".to_string();
        }

        let mut output = String::new();
        for (table, columns) in &self.tables {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&format!("Table: {}\n", table));
            for column in columns {
                output.push_str(&format!("  - {} ({})\n", column.name, column.data_type));
            }
        }
        output
    }
}
