//! In-memory record of gate decisions.
//!
//! Keeps the most recent entries up to a fixed capacity; older entries are
//! dropped first.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// What happened to a candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Passed the gate and ran.
    Executed { rows: usize },
    /// Refused by the validator.
    Rejected { reason: String },
    /// Passed the gate but the engine returned an error.
    Failed { error: String },
}

/// A single history entry.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Unique entry id.
    pub id: Uuid,

    /// When the decision was made.
    pub at: DateTime<Utc>,

    /// The SQL as submitted (executed entries hold the sanitized form).
    pub sql: String,

    /// Result of the attempt.
    pub outcome: Outcome,
}

/// Shared history handle.
pub type SharedHistory = Arc<QueryHistory>;

/// Bounded, thread-safe query history.
#[derive(Debug)]
pub struct QueryHistory {
    entries: RwLock<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl QueryHistory {
    /// Create a history that keeps at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record an outcome and return the new entry's id.
    pub fn record(&self, sql: impl Into<String>, outcome: Outcome) -> Uuid {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            at: Utc::now(),
            sql: sql.into(),
            outcome,
        };
        let id = entry.id;

        if self.capacity == 0 {
            return id;
        }

        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        id
    }

    /// The `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.read().iter().rev().take(n).cloned().collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Maximum number of stored entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
