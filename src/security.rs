//! Security module: the SQL safety gate.
//!
//! Candidate SQL goes through [`validate`] first; only allowed queries are
//! passed through [`sanitize`] and on to an execution engine. Both functions
//! are pure and safe to call from any thread.

mod injection;
mod literals;
mod sanitize;
mod validation;

pub use injection::{InjectionDetector, InjectionPattern};
pub use literals::strip_literal_contents;
pub use sanitize::sanitize;
pub use validation::{SqlValidator, Verdict};
pub(crate) use validation::truncate_for_log;

/// Validate a candidate SQL string.
///
/// Returns `(true, "")` when the query may be executed, otherwise `false`
/// and the user-facing rejection reason.
///
/// # Examples
///
/// ```
/// use querygate::security::validate;
///
/// assert_eq!(validate("SELECT * FROM sales"), (true, String::new()));
/// assert!(!validate("DELETE FROM sales").0);
/// ```
pub fn validate(sql: &str) -> (bool, String) {
    SqlValidator::new().validate(sql)
}
