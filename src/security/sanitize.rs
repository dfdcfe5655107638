//! Normalization of validated SQL before execution.

use crate::constants::STATEMENT_TERMINATOR;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A quoted literal, or a run of whitespace outside one.
static LITERAL_OR_WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'[^']*'|"[^"]*"|\s+"#)
        .unwrap_or_else(|e| panic!("Internal error: invalid sanitize pattern: {}", e))
});

/// Produce the exact string handed to the execution engine.
///
/// Trims, drops one trailing statement terminator and collapses whitespace
/// runs to a single space. Literal contents are copied through untouched.
///
/// Only call this on SQL the validator allowed: it performs no safety
/// checks of its own.
///
/// # Examples
///
/// ```
/// use querygate::security::sanitize;
///
/// assert_eq!(sanitize("  SELECT  *\nFROM t; "), "SELECT * FROM t");
/// ```
pub fn sanitize(sql: &str) -> String {
    let trimmed = sql.trim();
    let body = trimmed
        .strip_suffix(STATEMENT_TERMINATOR)
        .unwrap_or(trimmed)
        .trim_end();

    LITERAL_OR_WHITESPACE
        .replace_all(body, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if matched.starts_with('\'') || matched.starts_with('"') {
                matched.to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}
