//! SQL injection detection.
//!
//! Detects comment markers and common injection idioms in a query whose
//! literal contents have already been stripped.

use crate::error::Rejection;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Known injection idioms, each reported with its own label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPattern {
    /// `OR 1=1`
    OrOneEqualsOne,
    /// `OR '1'='1'` (any literal compared with a literal after OR)
    OrQuotedTautology,
    /// `AND 1=0`
    AndOneEqualsZero,
    /// `UNION ALL SELECT`
    UnionAllSelect,
}

impl InjectionPattern {
    /// Human-readable label used in rejection reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OrOneEqualsOne => "OR 1=1 tautology",
            Self::OrQuotedTautology => "OR '1'='1' tautology",
            Self::AndOneEqualsZero => "AND 1=0 contradiction",
            Self::UnionAllSelect => "UNION ALL SELECT",
        }
    }
}

/// Compiled regex patterns for SQL injection detection.
///
/// These patterns are compiled once at first use (lazy static) for performance.
/// They run against literal-stripped text, so a quoted literal shows up as
/// `''` and the quoted tautology is matched on that shape.
static INJECTION_PATTERNS: Lazy<Vec<(Regex, InjectionPattern)>> = Lazy::new(|| {
    fn compile(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap_or_else(|e| {
            panic!("Internal error: invalid regex pattern '{}': {}", pattern, e)
        })
    }

    vec![
        (
            compile(r"(?i)\bOR\s+1\s*=\s*1\b"),
            InjectionPattern::OrOneEqualsOne,
        ),
        (
            compile(r"(?i)\bOR\s+''\s*=\s*''"),
            InjectionPattern::OrQuotedTautology,
        ),
        (
            compile(r"(?i)\bAND\s+1\s*=\s*0\b"),
            InjectionPattern::AndOneEqualsZero,
        ),
        (
            compile(r"(?i)\bUNION\s+ALL\s+SELECT\b"),
            InjectionPattern::UnionAllSelect,
        ),
    ]
});

/// SQL injection detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionDetector;

impl InjectionDetector {
    /// Create a new injection detector.
    pub fn new() -> Self {
        Self
    }

    /// Check literal-stripped SQL for comments and injection idioms.
    ///
    /// Comments outside literals are refused outright; after that the
    /// patterns are tried in a fixed order and the first match is reported.
    pub fn check(&self, stripped: &str) -> Option<Rejection> {
        if stripped.contains("--") || stripped.contains("/*") {
            return Some(Rejection::Comment);
        }

        INJECTION_PATTERNS
            .iter()
            .find(|(regex, _)| regex.is_match(stripped))
            .map(|(_, pattern)| Rejection::Injection { pattern: *pattern })
    }
}
