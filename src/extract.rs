//! Extraction of candidate SQL from model output.
//!
//! Language models tend to wrap SQL in markdown code fences and lead with a
//! comment line describing the query. The validator expects plain SQL text, so
//! this cleanup happens first. The result is still only a candidate and must
//! be validated.

use once_cell::sync::Lazy;
use regex::Regex;

/// First fenced code block: opening fence, body, and the closing fence (or end
/// of input when the model stopped mid-block).
///
/// A language tag only counts when a line break follows it, or when it is a
/// bare `sql` followed by spaces on a one-line block. Otherwise
/// ```` ```SELECT 1``` ```` would lose its first keyword.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n|(?i:sql)[ \t]+)?(.*?)(?:```|\z)")
        .unwrap_or_else(|e| panic!("Internal error: invalid code fence pattern: {}", e))
});

/// Pull the SQL text out of a model response.
///
/// Returns `None` when nothing but fences, comments and whitespace remain.
///
/// # Examples
///
/// ```
/// use querygate::extract::extract_sql;
///
/// let response = "```sql\n-- total sales\nSELECT SUM(amount) FROM sales;\n```";
/// assert_eq!(
///     extract_sql(response).as_deref(),
///     Some("SELECT SUM(amount) FROM sales;")
/// );
/// ```
pub fn extract_sql(response: &str) -> Option<String> {
    let body = CODE_FENCE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map_or(response, |m| m.as_str());

    let sql = strip_leading_comment_lines(body).trim();
    if sql.is_empty() {
        None
    } else {
        Some(sql.to_string())
    }
}

/// Drop blank lines and `--` comment lines from the start of the text.
fn strip_leading_comment_lines(text: &str) -> &str {
    let mut rest = text;
    loop {
        let line_end = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let line = rest[..line_end].trim();
        if line.is_empty() && line_end == rest.len() {
            return "";
        }
        if line.is_empty() || line.starts_with("--") {
            rest = &rest[line_end..];
            continue;
        }
        return rest;
    }
}
