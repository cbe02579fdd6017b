//! Error types for the notes core.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for note storage operations
pub type NotesResult<T> = Result<T, NotesError>;

/// Main error type for note storage operations.
///
/// Variants carry plain string payloads so the whole enum is `Clone`: a
/// failed one-time initialization (open or legacy migration) is memoized and
/// replayed to every later caller instead of being retried in-process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotesError {
    /// The storage engine could not be opened or read at all
    /// (missing directory, locked file, disabled storage, quota).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single upsert or remove against the durable store failed.
    #[error("write failed for note {id}: {message}")]
    WriteFailed { id: String, message: String },

    /// The one-time legacy import could not complete atomically.
    /// Legacy data is left in place so a later process can retry.
    #[error("legacy migration failed: {0}")]
    MigrationFailed(String),

    /// The legacy blob was present but was not valid note data.
    /// Callers treat this as an empty legacy store, never as fatal.
    #[error("legacy data unreadable: {0}")]
    ParseFailure(String),
}

impl NotesError {
    /// Create a new store-unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        NotesError::StoreUnavailable(message.into())
    }

    /// Create a new write-failed error for the given note id
    pub fn write_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        NotesError::WriteFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a new migration error
    pub fn migration(message: impl Into<String>) -> Self {
        NotesError::MigrationFailed(message.into())
    }
}
