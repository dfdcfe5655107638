//! Guarded query execution.
//!
//! The analytical engine itself lives outside this crate and is reached
//! through the [`QueryEngine`] trait. [`QueryGate`] is the only path from a
//! candidate SQL string to the engine: validate, sanitize, execute.

use crate::constants::MAX_LOGGED_SQL_LENGTH;
use crate::error::GateError;
use crate::history::{Outcome, SharedHistory};
use crate::security::{sanitize, truncate_for_log, SqlValidator, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Information about a result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Engine type name.
    pub sql_type: String,
}

impl ColumnInfo {
    /// Create a new column description.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Tabular result of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column descriptions in order.
    pub columns: Vec<ColumnInfo>,

    /// Result rows; each row has one value per column.
    pub rows: Vec<Vec<Value>>,

    /// Execution time in milliseconds.
    pub execution_time_ms: u64,

    /// Whether results were truncated due to row limit.
    pub truncated: bool,
}

impl QueryResult {
    /// Create an empty query result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a result from columns and rows.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Short status line describing the result.
    pub fn summary(&self) -> String {
        if self.rows.is_empty() {
            return "Query executed successfully. No rows returned.".to_string();
        }
        let mut summary = format!(
            "Query executed successfully. Returned {} row(s) with {} column(s).",
            self.rows.len(),
            self.columns.len()
        );
        if self.truncated {
            summary.push_str(" Results were truncated.");
        }
        summary
    }

    /// Keep at most `max_rows` rows, marking the result truncated if any were dropped.
    pub fn truncate(&mut self, max_rows: usize) {
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.truncated = true;
        }
    }

    /// Format the result as a markdown table.
    pub fn to_markdown_table(&self) -> String {
        if self.columns.is_empty() {
            return self.summary();
        }

        let mut output = String::new();

        // Header row
        let headers: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        output.push_str("| ");
        output.push_str(&headers.join(" | "));
        output.push_str(" |\n");

        // Separator row
        output.push_str("| ");
        output.push_str(
            &headers
                .iter()
                .map(|h| "-".repeat(h.len().max(3)))
                .collect::<Vec<_>>()
                .join(" | "),
        );
        output.push_str(" |\n");

        for row in &self.rows {
            let values: Vec<String> = (0..self.columns.len())
                .map(|i| row.get(i).map_or_else(|| "NULL".to_string(), display_value))
                .collect();
            output.push_str("| ");
            output.push_str(&values.join(" | "));
            output.push_str(" |\n");
        }

        output.push_str(&format!("\n_{} row(s)_", self.rows.len()));
        if self.truncated {
            output.push_str(" _(truncated)_");
        }
        output.push_str(&format!(" _({} ms)_", self.execution_time_ms));

        output
    }

    /// Format the result as CSV.
    pub fn to_csv(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }

        let mut output = String::new();

        let headers: Vec<String> = self.columns.iter().map(|c| escape_csv(&c.name)).collect();
        output.push_str(&headers.join(","));
        output.push('\n');

        for row in &self.rows {
            let values: Vec<String> = (0..self.columns.len())
                .map(|i| match row.get(i) {
                    None | Some(Value::Null) => String::new(),
                    Some(v) => escape_csv(&display_value(v)),
                })
                .collect();
            output.push_str(&values.join(","));
            output.push('\n');
        }

        output
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// An analytical engine that runs sanitized SQL.
///
/// Implementations return engine errors as [`GateError::QueryExecution`]
/// with the engine's own message; the gate does not rewrite them.
pub trait QueryEngine {
    /// Execute a single read query.
    fn execute(&self, sql: &str) -> Result<QueryResult, GateError>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn execute(&self, sql: &str) -> Result<QueryResult, GateError> {
        (**self).execute(sql)
    }
}

/// The validate → sanitize → execute pipeline.
pub struct QueryGate<E> {
    engine: E,
    validator: SqlValidator,
    max_rows: usize,
    history: Option<SharedHistory>,
}

impl<E: QueryEngine> QueryGate<E> {
    /// Create a new gate in front of `engine`.
    pub fn new(engine: E, max_rows: usize) -> Self {
        Self {
            engine,
            validator: SqlValidator::new(),
            max_rows,
            history: None,
        }
    }

    /// Record every attempt in `history`.
    pub fn with_history(mut self, history: SharedHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Validate and sanitize without executing.
    ///
    /// Returns the exact string that [`run`](Self::run) would hand to the engine.
    pub fn prepare(&self, sql: &str) -> Result<String, GateError> {
        match self.validator.check(sql) {
            Verdict::Allowed => Ok(sanitize(sql)),
            Verdict::Rejected { reason } => Err(GateError::Rejected(reason)),
        }
    }

    /// Run a candidate query through the gate.
    ///
    /// Rejected queries never reach the engine. Engine errors are returned
    /// unchanged and are not retried.
    pub fn run(&self, sql: &str) -> Result<QueryResult, GateError> {
        let prepared = match self.prepare(sql) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.record(sql, Outcome::Rejected {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        debug!(sql = %truncate_for_log(&prepared, MAX_LOGGED_SQL_LENGTH), "Executing query");
        let start = Instant::now();

        match self.engine.execute(&prepared) {
            Ok(mut result) => {
                result.truncate(self.max_rows);
                if result.execution_time_ms == 0 {
                    result.execution_time_ms = start.elapsed().as_millis() as u64;
                }
                info!(
                    rows = result.rows.len(),
                    truncated = result.truncated,
                    elapsed_ms = result.execution_time_ms,
                    "Query executed"
                );
                self.record(&prepared, Outcome::Executed {
                    rows: result.rows.len(),
                });
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "Query execution failed");
                self.record(&prepared, Outcome::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn record(&self, sql: &str, outcome: Outcome) {
        if let Some(history) = &self.history {
            history.record(sql, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;
    use crate::history::QueryHistory;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    /// Engine that records what it was asked to run.
    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Vec<String>>,
        fail_with: Option<String>,
        rows: usize,
    }

    impl QueryEngine for RecordingEngine {
        fn execute(&self, sql: &str) -> Result<QueryResult, GateError> {
            self.seen.lock().push(sql.to_string());
            if let Some(message) = &self.fail_with {
                return Err(GateError::query_error(message.clone()));
            }
            let rows = (0..self.rows).map(|i| vec![json!(i)]).collect();
            Ok(QueryResult::new(vec![ColumnInfo::new("n", "INTEGER")], rows))
        }
    }

    fn sample_result() -> QueryResult {
        QueryResult::new(
            vec![
                ColumnInfo::new("id", "INTEGER"),
                ColumnInfo::new("name", "VARCHAR"),
            ],
            vec![
                vec![json!(1), json!("Alice")],
                vec![json!(2), json!("Smith, Bob")],
                vec![json!(3), Value::Null],
            ],
        )
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            QueryResult::empty().summary(),
            "Query executed successfully. No rows returned."
        );
        assert_eq!(
            sample_result().summary(),
            "Query executed successfully. Returned 3 row(s) with 2 column(s)."
        );
    }

    #[test]
    fn test_markdown_table() {
        let table = sample_result().to_markdown_table();
        assert!(table.starts_with("| id | name |\n| --- | ---- |\n"));
        assert!(table.contains("| 1 | Alice |"));
        assert!(table.contains("| 3 | NULL |"));
        assert!(table.contains("_3 row(s)_"));
    }

    #[test]
    fn test_csv_output() {
        let csv = sample_result().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,name");
        assert_eq!(lines[1], "1,Alice");
        assert_eq!(lines[2], "2,\"Smith, Bob\"");
        assert_eq!(lines[3], "3,");
    }

    #[test]
    fn test_csv_quotes_carriage_returns() {
        let result = QueryResult::new(
            vec![ColumnInfo::new("note", "TEXT")],
            vec![vec![json!("line one\rline two")]],
        );
        assert_eq!(result.to_csv(), "note\n\"line one\rline two\"\n");
    }

    #[test]
    fn test_truncate() {
        let mut result = sample_result();
        result.truncate(5);
        assert!(!result.truncated);
        result.truncate(2);
        assert!(result.truncated);
        assert_eq!(result.rows.len(), 2);
        assert!(result.summary().ends_with("Results were truncated."));
    }

    #[test]
    fn test_gate_executes_sanitized_sql() {
        let engine = RecordingEngine {
            rows: 2,
            ..Default::default()
        };
        let gate = QueryGate::new(&engine, 100);

        let result = gate.run("  SELECT  n\nFROM t; ").expect("allowed");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(*engine.seen.lock(), vec!["SELECT n FROM t".to_string()]);
    }

    #[test]
    fn test_gate_never_calls_engine_on_rejection() {
        let engine = RecordingEngine::default();
        let gate = QueryGate::new(&engine, 100);

        let err = gate.run("SELECT 1; DROP TABLE t").unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::MultipleStatements));
        assert!(engine.seen.lock().is_empty());
    }

    #[test]
    fn test_gate_passes_engine_errors_through() {
        let engine = RecordingEngine {
            fail_with: Some("Catalog Error: Table with name nope does not exist!".to_string()),
            ..Default::default()
        };
        let gate = QueryGate::new(&engine, 100);

        match gate.run("SELECT * FROM nope") {
            Err(GateError::QueryExecution { message }) => {
                assert_eq!(message, "Catalog Error: Table with name nope does not exist!");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(engine.seen.lock().len(), 1);
    }

    #[test]
    fn test_gate_truncates_rows() {
        let engine = RecordingEngine {
            rows: 10,
            ..Default::default()
        };
        let result = QueryGate::new(engine, 3).run("SELECT n FROM t").expect("allowed");
        assert_eq!(result.rows.len(), 3);
        assert!(result.truncated);
    }

    #[test]
    fn test_gate_records_history() {
        let history = Arc::new(QueryHistory::new(10));
        let engine = RecordingEngine {
            rows: 1,
            ..Default::default()
        };
        let gate = QueryGate::new(engine, 100).with_history(Arc::clone(&history));

        gate.run("SELECT n FROM t;").expect("allowed");
        let _ = gate.run("DROP TABLE t");

        let recent = history.recent(2);
        assert!(matches!(recent[0].outcome, Outcome::Rejected { .. }));
        assert_eq!(recent[0].sql, "DROP TABLE t");
        assert_eq!(recent[1].outcome, Outcome::Executed { rows: 1 });
        assert_eq!(recent[1].sql, "SELECT n FROM t");
    }

    #[test]
    fn test_prepare() {
        let gate = QueryGate::new(RecordingEngine::default(), 100);
        assert_eq!(
            gate.prepare("SELECT *\n  FROM sales;").expect("allowed"),
            "SELECT * FROM sales"
        );
        assert!(gate.prepare("").is_err());
        assert!(gate.engine().seen.lock().is_empty());
    }
}
