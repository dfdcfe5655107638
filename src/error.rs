//! Error types for querygate.
//!
//! Rejections are not failures of the gate itself: they are the normal
//! outcome for unsafe input and carry the user-facing reason text. `GateError`
//! covers everything else (bad input files, engine errors).

use crate::security::InjectionPattern;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a candidate SQL string was refused.
///
/// The `Display` output is surfaced verbatim to the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// Empty or whitespace-only input.
    Empty,
    /// A statement terminator outside literals before the optional trailing one.
    MultipleStatements,
    /// The query does not start with SELECT or WITH.
    NotReadOnly,
    /// A denylisted keyword appears as a whole word outside literals.
    DangerousKeyword { keyword: &'static str },
    /// A line or block comment opener appears outside literals.
    Comment,
    /// A known injection idiom was matched.
    Injection { pattern: InjectionPattern },
}

impl Rejection {
    /// Short machine-friendly tag for logs and JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::MultipleStatements => "multiple_statements",
            Self::NotReadOnly => "not_read_only",
            Self::DangerousKeyword { .. } => "dangerous_keyword",
            Self::Comment => "comment",
            Self::Injection { .. } => "injection",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty query"),
            Self::MultipleStatements => write!(
                f,
                "Multiple SQL statements detected. Only single SELECT queries are allowed."
            ),
            Self::NotReadOnly => write!(
                f,
                "Only SELECT queries are allowed. Query must start with SELECT or WITH."
            ),
            Self::DangerousKeyword { keyword } => write!(
                f,
                "Dangerous SQL keyword detected: {}. Only SELECT queries are allowed.",
                keyword
            ),
            Self::Comment => write!(
                f,
                "Potential SQL injection detected: SQL comment outside string literal"
            ),
            Self::Injection { pattern } => {
                write!(f, "Potential SQL injection detected: {}", pattern.label())
            }
        }
    }
}

/// Domain-specific errors for querygate.
#[derive(Debug, Error)]
pub enum GateError {
    /// The candidate SQL was refused by the validator
    #[error("{0}")]
    Rejected(Rejection),

    /// Query execution error, passed through from the engine unchanged
    #[error("Query execution error: {message}")]
    QueryExecution { message: String },

    /// Invalid input (schema files, model responses)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Create a query execution error.
    pub fn query_error(msg: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: msg.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The rejection carried by this error, if it is one.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(r) => Some(*r),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Rejected(Rejection::Empty) => Some("Provide a SELECT query"),
            Self::Rejected(Rejection::MultipleStatements) => {
                Some("Submit one statement at a time")
            }
            Self::Rejected(Rejection::NotReadOnly | Rejection::DangerousKeyword { .. }) => {
                Some("Rephrase the request as a read-only SELECT query")
            }
            Self::Rejected(Rejection::Comment) => Some("Remove SQL comments from the query"),
            Self::Rejected(Rejection::Injection { .. }) => {
                Some("Rewrite the filter without always-true or always-false conditions")
            }
            Self::InvalidInput(_) => Some("Check the input format"),
            _ => None,
        }
    }
}

impl From<Rejection> for GateError {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}

impl From<rusqlite::Error> for GateError {
    fn from(e: rusqlite::Error) -> Self {
        Self::query_error(e.to_string())
    }
}

impl From<serde_json::Error> for GateError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidInput(format!("JSON error: {}", e))
    }
}
