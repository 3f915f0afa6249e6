use thiserror::Error;

use crate::entities::{EntityId, EntityKind};

/// Errors raised by the persistence layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: EntityId },

    #[error("expected a {expected} record or patch, got {found}")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("order {id} was modified concurrently (expected revision {expected}, found {found})")]
    RevisionConflict {
        id: EntityId,
        expected: u64,
        found: u64,
    },

    #[error("store rejected write to {kind} {id}: {reason}")]
    Rejected {
        kind: EntityKind,
        id: EntityId,
        reason: String,
    },

    #[error("storage backend error: {message}")]
    Backend { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Conflicts are worth retrying after re-reading the record
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::RevisionConflict { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}
