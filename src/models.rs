//! Data models for the notes core.
//!
//! This module defines the `Note` entity and the patch type used for
//! partial updates. New note IDs are UUID7, rendered as hex strings; stored
//! IDs are opaque strings so records imported from the legacy store keep
//! whatever identifier they were created with.
//!
//! All timestamps are Unix milliseconds. Serialized field names are
//! camelCase to match the record shape used by the legacy blob format.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder title written to the durable store when a note's title is
/// empty. In-memory notes keep the raw (possibly empty) title.
pub const UNTITLED: &str = "Untitled";

/// Represents a note in the system.
///
/// Notes contain a title, text content, a favorite flag, and metadata about
/// creation and modification times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, immutable after creation
    pub id: String,
    /// Note title, may be empty in memory
    pub title: String,
    /// Note text content, may be empty
    pub content: String,
    /// Whether the note is favorited
    #[serde(default)]
    pub favorite: bool,
    /// When the note was created (Unix ms), never mutated
    pub created_at: i64,
    /// When the note was last modified (Unix ms), advanced on every mutation
    pub updated_at: i64,
}

impl Note {
    /// Create a new note with the given title and content.
    ///
    /// Assigns a fresh UUID7 id and sets both timestamps to now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: new_note_id(),
            title: title.into(),
            content: content.into(),
            favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether both title and content are empty after trimming.
    ///
    /// Blank notes are not save-eligible: the persistence path skips them.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    /// The title as written to durable storage: empty titles become
    /// [`UNTITLED`].
    pub fn saved_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Advance `updated_at` for a mutation happening now.
    ///
    /// Guarantees a strict increase even when two mutations land within the
    /// same clock millisecond.
    pub fn touch(&mut self) {
        self.updated_at = next_timestamp(self.updated_at);
    }
}

/// A partial update to a note. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub favorite: Option<bool>,
}

impl NotePatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the favorite flag
    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    /// Apply this patch over an existing note, leaving `id`, `created_at`
    /// and `updated_at` untouched.
    pub fn apply(&self, note: &mut Note) {
        if let Some(ref title) = self.title {
            note.title = title.clone();
        }
        if let Some(ref content) = self.content {
            note.content = content.clone();
        }
        if let Some(favorite) = self.favorite {
            note.favorite = favorite;
        }
    }
}

/// Generate a new note id (UUID7 as hex string)
pub fn new_note_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Current wall clock time in Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for a mutation happening now, strictly after `prev`.
pub fn next_timestamp(prev: i64) -> i64 {
    now_ms().max(prev + 1)
}
