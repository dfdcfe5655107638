//! String literal handling.
//!
//! Quoted literals are matched lexically: a quote, any run of non-quote
//! characters, and the closing quote. Escaped quotes (`''` or `\'`) inside a
//! literal are not understood; a doubled quote is seen as two adjacent
//! literals.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("Internal error: invalid regex pattern '{}': {}", pattern, e))
}

static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| compile(r"'[^']*'"));

static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| compile(r#""[^"]*""#));

/// Replace the contents of every quoted literal with nothing.
///
/// Quotes themselves are kept so the surrounding structure (`name = ''`)
/// stays visible to later checks. Single-quoted literals are stripped first,
/// then double-quoted ones on the result.
pub fn strip_literal_contents(sql: &str) -> String {
    let without_single = SINGLE_QUOTED.replace_all(sql, "''");
    DOUBLE_QUOTED.replace_all(&without_single, "\"\"").into_owned()
}
