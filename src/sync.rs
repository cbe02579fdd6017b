//! Reactive note synchronizer.
//!
//! [`NoteSynchronizer`] owns the in-memory note collection the UI reads.
//! Mutations apply to memory synchronously, so callers can re-render
//! immediately, and are mirrored to the durable store by a detached writer
//! task. Each mirror message captures the full record value at enqueue
//! time, so later in-memory edits never alter an in-flight write.
//!
//! The writer applies operations in the order they were issued. That keeps
//! the durable end state equal to the last in-memory truth even when a note
//! is created and deleted before its first write lands. Failed writes are
//! logged and never rolled back in memory; the next mutation of the same
//! note re-persists its full state.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::NotesResult;
use crate::models::{Note, NotePatch};
use crate::store::NoteStore;

enum WriteOp {
    Upsert(Note),
    Remove(String),
    Flush(oneshot::Sender<()>),
}

/// In-memory note collection with asynchronous mirroring to a
/// [`NoteStore`].
///
/// Must be created inside a tokio runtime; construction spawns the writer
/// task. Memory stays authoritative for all reads.
pub struct NoteSynchronizer {
    notes: Vec<Note>,
    store: Arc<NoteStore>,
    writer: mpsc::UnboundedSender<WriteOp>,
}

impl NoteSynchronizer {
    /// Create a synchronizer over the given store and spawn its writer task.
    ///
    /// The writer stops when the synchronizer is dropped and its queue
    /// drains.
    pub fn new(store: Arc<NoteStore>) -> Self {
        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&store), rx));
        Self {
            notes: Vec::new(),
            store,
            writer,
        }
    }

    /// Load the collection from durable storage, replacing memory.
    ///
    /// On failure memory keeps its current (initially empty) state and the
    /// error is returned: the application stays usable in a degraded,
    /// memory-only mode. Not retried automatically.
    pub async fn load(&mut self) -> NotesResult<()> {
        let mut notes = self.store.read_all().await?;
        // In-memory order is most-recent-first
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.notes = notes;
        Ok(())
    }

    /// Create a note and return its id.
    ///
    /// The note is inserted at the front of the collection and queued for
    /// persistence; the returned id lets the caller select it immediately
    /// without waiting on storage.
    pub fn create(&mut self, title: Option<String>, content: Option<String>) -> String {
        let note = Note::new(title.unwrap_or_default(), content.unwrap_or_default());
        let id = note.id.clone();
        self.notes.insert(0, note.clone());
        self.persist(note);
        id
    }

    /// Merge a patch over the note at `id`; a no-op when the id is absent.
    pub fn update(&mut self, id: &str, patch: NotePatch) {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return;
        };
        patch.apply(note);
        note.touch();
        let snapshot = note.clone();
        self.persist(snapshot);
    }

    /// Flip the favorite flag of the note at `id`; a no-op when absent.
    pub fn toggle_favorite(&mut self, id: &str) {
        let Some(favorite) = self.notes.iter().find(|n| n.id == id).map(|n| n.favorite) else {
            return;
        };
        self.update(id, NotePatch::new().favorite(!favorite));
    }

    /// Remove the note at `id` from memory (no-op when absent) and queue
    /// the durable delete.
    ///
    /// Callers holding a "currently open" reference compare it against this
    /// id themselves; the synchronizer has no selection state.
    pub fn delete(&mut self, id: &str) {
        self.notes.retain(|n| n.id != id);
        if self.writer.send(WriteOp::Remove(id.to_string())).is_err() {
            tracing::error!("persistence writer gone; delete of note {} is not durable", id);
        }
    }

    /// Derive the filtered, sorted view of the collection.
    ///
    /// The query is trimmed; empty matches everything, otherwise notes whose
    /// title or content contains it case-insensitively. Sorted favorites
    /// first, then most recently updated. Pure and recomputed per call.
    pub fn view(&self, query: &str) -> Vec<Note> {
        let q = query.trim().to_lowercase();
        let mut result: Vec<Note> = if q.is_empty() {
            self.notes.clone()
        } else {
            self.notes
                .iter()
                .filter(|n| {
                    n.title.to_lowercase().contains(&q) || n.content.to_lowercase().contains(&q)
                })
                .cloned()
                .collect()
        };

        result.sort_by(|a, b| {
            b.favorite
                .cmp(&a.favorite)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        result
    }

    /// The raw in-memory collection, most-recent-first
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Wait until every write queued so far has been attempted.
    ///
    /// For tests and host shutdown; mutations themselves never block on
    /// persistence.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.writer.send(WriteOp::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    fn persist(&self, note: Note) {
        // Blank notes are not save-eligible. Queue a delete instead of an
        // upsert so a note edited down to blank does not leave its stale
        // content in the durable store; deleting a never-persisted id is a
        // no-op.
        let op = if note.is_blank() {
            tracing::debug!("note {} is blank; clearing its durable record", note.id);
            WriteOp::Remove(note.id)
        } else {
            WriteOp::Upsert(note)
        };
        if self.writer.send(op).is_err() {
            tracing::error!("persistence writer gone; note changes are not durable");
        }
    }
}

async fn run_writer(store: Arc<NoteStore>, mut rx: mpsc::UnboundedReceiver<WriteOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::Upsert(note) => {
                if let Err(e) = store.upsert(&note).await {
                    tracing::error!("failed to persist note {}: {}", note.id, e);
                }
            }
            WriteOp::Remove(id) => {
                if let Err(e) = store.remove(&id).await {
                    tracing::error!("failed to delete note {}: {}", id, e);
                }
            }
            WriteOp::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
