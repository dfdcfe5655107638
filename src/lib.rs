//! # querygate
//!
//! A safety gate for SQL produced by a language model from a natural
//! language question.
//!
//! This crate provides:
//! - **Validation**: a fixed sequence of lexical checks that decides whether
//!   a candidate query is a single read-only statement free of known
//!   injection idioms
//! - **Sanitization**: whitespace and terminator normalization of allowed SQL
//! - **Extraction**: cleanup of model output before validation
//! - **Guarded execution**: a validate → sanitize → execute pipeline in front
//!   of any engine implementing [`engine::QueryEngine`], with a read-only
//!   SQLite engine provided
//!
//! ## Architecture
//!
//! The validator and sanitizer are pure functions over strings. The fixed
//! keyword and pattern tables are compiled once and never mutated, so both
//! can be called from any number of threads without coordination.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod extract;
pub mod history;
pub mod schema;
pub mod security;
pub mod sqlite;

pub use config::Config;
pub use engine::{QueryEngine, QueryGate, QueryResult};
pub use error::{GateError, Rejection};
pub use security::{sanitize, validate, SqlValidator, Verdict};
pub use sqlite::SqliteEngine;
