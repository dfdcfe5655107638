//! Centralized constants for querygate.
//!
//! This module contains the fixed security tables and default values used
//! throughout the codebase, making them easy to find, understand, and modify.

// =============================================================================
// Validation Constants
// =============================================================================

/// Keywords that disqualify a query when they appear as a whole word outside
/// string literals.
///
/// Order matters: when several are present, the first one in this list is the
/// one reported.
pub const DENYLIST_KEYWORDS: &[&str] = &[
    "INSERT",
    "UPDATE",
    "DELETE",
    "DROP",
    "ALTER",
    "CREATE",
    "TRUNCATE",
    "REPLACE",
    "RENAME",
    "GRANT",
    "REVOKE",
    "COMMIT",
    "ROLLBACK",
    "SAVEPOINT",
    "EXEC",
    "EXECUTE",
    "ATTACH",
    "DETACH",
    "PRAGMA",
];

/// Statement terminator character.
pub const STATEMENT_TERMINATOR: char = ';';

// =============================================================================
// Result Size Constants
// =============================================================================

/// Default maximum result rows returned by the guarded executor.
pub const DEFAULT_MAX_RESULT_ROWS: usize = 10_000;

/// Maximum length of SQL text written to logs.
pub const MAX_LOGGED_SQL_LENGTH: usize = 200;

// =============================================================================
// History Constants
// =============================================================================

/// Default number of gate decisions kept in the in-memory history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
