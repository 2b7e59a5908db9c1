//! Domain errors for records and their status transitions

use thiserror::Error;

use crate::status::RecordState;

/// Error raised by record, status and arena operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// The record lacks the venue fields needed for a table-of-contents key.
    /// Dedupe treats this as "skip, cannot dedupe structurally".
    #[error("record {id}: not TOC-identifiable ({reason})")]
    NotTocIdentifiable { id: String, reason: String },

    /// A status change that is not a legal single-step transition.
    #[error("record {id}: invalid status transition {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: RecordState,
        to: RecordState,
    },

    /// No record (active or retired) with this ID.
    #[error("unknown record: {0}")]
    UnknownRecord(String),

    /// The record was merged into another record and is no longer active.
    #[error("record {id} was merged into {merged_into}")]
    RecordRetired { id: String, merged_into: String },

    /// An ID that is already taken (IDs are never reused, even after retirement).
    #[error("duplicate record id: {0}")]
    DuplicateId(String),

    /// A merge whose survivor and loser are the same record.
    #[error("record {0} cannot be merged into itself")]
    SelfMerge(String),

    /// Status string that does not name a known state.
    #[error("unknown record state: {0}")]
    UnknownState(String),
}

impl ReviewError {
    /// Whether dedupe should skip the record instead of failing the batch.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::NotTocIdentifiable { .. })
    }
}
