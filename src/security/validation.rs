//! Read-only query validation.
//!
//! The validator is a lexical filter, not a parser. It runs a fixed sequence
//! of checks and the first one that fails decides the verdict:
//!
//! 1. empty input
//! 2. more than one statement
//! 3. statement kind (must start with SELECT or WITH)
//! 4. denylisted keywords
//! 5. comments and injection idioms

use crate::constants::{DENYLIST_KEYWORDS, MAX_LOGGED_SQL_LENGTH, STATEMENT_TERMINATOR};
use crate::error::Rejection;
use crate::security::injection::InjectionDetector;
use crate::security::literals::strip_literal_contents;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Outcome of validating a candidate SQL string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Safe to sanitize and execute.
    Allowed,
    /// Must not be executed.
    Rejected { reason: Rejection },
}

impl Verdict {
    /// Returns true if this is an Allowed verdict.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// The rejection reason, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Allowed => None,
            Self::Rejected { reason } => Some(*reason),
        }
    }

    /// Convert to the `(allowed, reason)` pair; the reason is empty when allowed.
    pub fn into_pair(self) -> (bool, String) {
        match self {
            Self::Allowed => (true, String::new()),
            Self::Rejected { reason } => (false, reason.to_string()),
        }
    }
}

impl From<Rejection> for Verdict {
    fn from(reason: Rejection) -> Self {
        Self::Rejected { reason }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("Internal error: invalid regex pattern '{}': {}", pattern, e))
}

/// Allowed statement kinds. CTEs are read queries too.
static READ_QUERY_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"(?i)^(SELECT|WITH)\b"));

/// Whole-word patterns for the denylist, in denylist order.
///
/// `\b` treats letters, digits and underscore as identifier characters, so
/// `created_at` does not match `CREATE`.
static DENYLIST_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    DENYLIST_KEYWORDS
        .iter()
        .map(|keyword| (compile(&format!(r"\b{}\b", keyword)), *keyword))
        .collect()
});

/// Query validator.
///
/// Holds no mutable state; a single instance can be shared freely across
/// threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlValidator {
    injection: InjectionDetector,
}

impl SqlValidator {
    /// Create a new query validator.
    pub fn new() -> Self {
        Self {
            injection: InjectionDetector::new(),
        }
    }

    /// Validate a candidate SQL string.
    pub fn check(&self, sql: &str) -> Verdict {
        match self.first_rejection(sql) {
            None => Verdict::Allowed,
            Some(reason) => {
                debug!(
                    reason = reason.code(),
                    sql = %truncate_for_log(sql.trim(), MAX_LOGGED_SQL_LENGTH),
                    "Rejected candidate SQL"
                );
                Verdict::Rejected { reason }
            }
        }
    }

    /// Validate and return the `(allowed, reason)` pair.
    pub fn validate(&self, sql: &str) -> (bool, String) {
        self.check(sql).into_pair()
    }

    fn first_rejection(&self, sql: &str) -> Option<Rejection> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Some(Rejection::Empty);
        }

        let stripped = strip_literal_contents(sql);

        if has_multiple_statements(&stripped) {
            return Some(Rejection::MultipleStatements);
        }

        if !READ_QUERY_PATTERN.is_match(sql) {
            return Some(Rejection::NotReadOnly);
        }

        let upper = stripped.to_uppercase();
        if let Some(keyword) = find_denylisted_keyword(&upper) {
            return Some(Rejection::DangerousKeyword { keyword });
        }

        self.injection.check(&stripped)
    }
}

/// Check literal-stripped SQL for a terminator before the optional trailing one.
fn has_multiple_statements(stripped: &str) -> bool {
    let body = stripped.trim_end();
    let body = body.strip_suffix(STATEMENT_TERMINATOR).unwrap_or(body);
    body.contains(STATEMENT_TERMINATOR)
}

/// Find the first denylisted keyword (in denylist order) present as a whole word.
fn find_denylisted_keyword(upper: &str) -> Option<&'static str> {
    DENYLIST_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(upper))
        .map(|(_, keyword)| *keyword)
}

/// Truncate a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}
