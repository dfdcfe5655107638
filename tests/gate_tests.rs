//! Integration tests for the querygate public API.
//!
//! These exercise the gate end to end: model output extraction, validation,
//! sanitization and guarded execution against an in-memory engine.

use querygate::engine::ColumnInfo;
use querygate::extract::extract_sql;
use querygate::history::{Outcome, QueryHistory};
use querygate::security::InjectionPattern;
use querygate::{
    sanitize, validate, GateError, QueryEngine, QueryGate, QueryResult, Rejection, SqlValidator,
};
use serde_json::json;
use std::sync::Arc;

/// Engine returning a fixed two-row table for any query.
struct FixedEngine;

impl QueryEngine for FixedEngine {
    fn execute(&self, _sql: &str) -> Result<QueryResult, GateError> {
        Ok(QueryResult::new(
            vec![
                ColumnInfo::new("region", "VARCHAR"),
                ColumnInfo::new("total", "DOUBLE"),
            ],
            vec![
                vec![json!("north"), json!(10.5)],
                vec![json!("south"), json!(3.0)],
            ],
        ))
    }
}

// =============================================================================
// Documented scenarios
// =============================================================================

#[test]
fn scenario_plain_select_allowed() {
    assert_eq!(validate("SELECT * FROM sales"), (true, String::new()));
}

#[test]
fn scenario_stacked_drop_rejected() {
    let (allowed, reason) = validate("SELECT * FROM sales; DROP TABLE sales");
    assert!(!allowed);
    assert!(reason.starts_with("Multiple SQL statements detected"));
}

#[test]
fn scenario_delete_rejected() {
    let (allowed, reason) = validate("DELETE FROM sales");
    assert!(!allowed);
    assert!(reason.contains("Only SELECT queries are allowed"));
}

#[test]
fn scenario_keyword_in_literal_allowed() {
    assert_eq!(
        validate("SELECT * FROM users WHERE name='DROP'"),
        (true, String::new())
    );
}

#[test]
fn scenario_or_tautology_rejected() {
    let (allowed, reason) = validate("SELECT * FROM t WHERE 1=1 OR 1=1");
    assert!(!allowed);
    assert!(reason.contains("OR 1=1"));
}

#[test]
fn scenario_sanitize() {
    assert_eq!(sanitize("  SELECT  *\nFROM t; "), "SELECT * FROM t");
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn whitespace_only_inputs_are_empty_queries() {
    for sql in ["", " ", "\t", "\n\n", " \r\n \t "] {
        assert_eq!(validate(sql), (false, "empty query".to_string()));
    }
}

#[test]
fn non_read_prefixes_rejected() {
    for sql in [
        "UPDATE t SET a = 1",
        "DROP TABLE t",
        "ATTACH 'x.db' AS x",
        "EXPLAIN SELECT 1",
        "(SELECT 1)",
        "VALUES (1)",
    ] {
        assert!(!validate(sql).0, "{sql} should be rejected");
    }
}

#[test]
fn every_denylisted_keyword_rejected_outside_literals() {
    for keyword in querygate::constants::DENYLIST_KEYWORDS {
        let sql = format!("SELECT a FROM t WHERE b = 1 {keyword} x");
        let verdict = SqlValidator::new().check(&sql);
        assert_eq!(
            verdict.rejection(),
            Some(Rejection::DangerousKeyword { keyword: *keyword })
        );

        let lower = sql.to_lowercase();
        assert!(!validate(&lower).0, "{lower} should be rejected");

        let quoted = format!("SELECT a FROM t WHERE b = '{keyword} THE BASS'");
        assert!(validate(&quoted).0, "{quoted} should be allowed");
    }
}

#[test]
fn semicolons() {
    assert!(validate("SELECT 1;").0);
    assert!(validate("SELECT ';' AS semi").0);
    assert!(!validate("SELECT 1; SELECT 2").0);
    assert!(!validate("SELECT 1;;").0);
}

#[test]
fn sanitize_is_idempotent_on_allowed_queries() {
    let queries = [
        "SELECT * FROM sales",
        "  select region,\n  SUM(total)\nFROM sales\nGROUP BY region ;\n",
        "WITH x AS (\n SELECT 1 AS n\n)\nSELECT n FROM x;",
        "SELECT * FROM t WHERE note = 'keep   this'",
    ];
    for sql in queries {
        assert!(validate(sql).0, "{sql} should be allowed");
        let once = sanitize(sql);
        assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn injection_labels_are_distinct() {
    let cases = [
        (
            "SELECT * FROM t WHERE id = 1 OR 1=1",
            InjectionPattern::OrOneEqualsOne,
        ),
        (
            "SELECT * FROM t WHERE id = '' OR '1'='1'",
            InjectionPattern::OrQuotedTautology,
        ),
        (
            "SELECT * FROM t WHERE id = 1 AND 1=0",
            InjectionPattern::AndOneEqualsZero,
        ),
        (
            "SELECT a FROM t UNION   ALL SELECT b FROM u",
            InjectionPattern::UnionAllSelect,
        ),
    ];
    let mut reasons = Vec::new();
    for (sql, pattern) in cases {
        let (allowed, reason) = validate(sql);
        assert!(!allowed);
        assert!(reason.ends_with(pattern.label()), "{reason}");
        reasons.push(reason);
    }
    reasons.dedup();
    assert_eq!(reasons.len(), 4);
}

#[test]
fn validator_is_shareable_across_threads() {
    let validator = Arc::new(SqlValidator::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let validator = Arc::clone(&validator);
            std::thread::spawn(move || {
                let sql = format!("SELECT {i} FROM t");
                validator.check(&sql).is_allowed()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("thread panicked"));
    }
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn model_output_through_gate() {
    let response = "Sure! Here's the query:\n```sql\n-- total by region\nSELECT region, SUM(total)\nFROM sales\nGROUP BY region;\n```";
    let candidate = extract_sql(response).expect("sql present");

    let history = Arc::new(QueryHistory::new(10));
    let gate = QueryGate::new(FixedEngine, 100).with_history(Arc::clone(&history));

    assert_eq!(
        gate.prepare(&candidate).expect("allowed"),
        "SELECT region, SUM(total) FROM sales GROUP BY region"
    );

    let result = gate.run(&candidate).expect("allowed");
    assert_eq!(
        result.summary(),
        "Query executed successfully. Returned 2 row(s) with 2 column(s)."
    );
    assert_eq!(history.recent(1)[0].outcome, Outcome::Executed { rows: 2 });
}

#[test]
fn rejected_model_output_reports_reason_verbatim() {
    let response = "```sql\nSELECT * FROM sales; DELETE FROM sales\n```";
    let candidate = extract_sql(response).expect("sql present");
    let gate = QueryGate::new(FixedEngine, 100);

    let err = gate.run(&candidate).unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::MultipleStatements));
    assert_eq!(err.to_string(), validate(&candidate).1);
}
