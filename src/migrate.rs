//! One-time migration from the legacy blob store.
//!
//! Earlier releases kept the whole note collection as one serialized JSON
//! array in a synchronous store. On first access, if the durable database is
//! empty and the legacy blob holds notes, the blob is imported as a single
//! atomic batch and then erased so the import never re-runs.
//!
//! The durable store is authoritative once it has any content: a non-empty
//! database short-circuits the whole procedure without touching the legacy
//! data. On a failed batch write the legacy blob is left intact so a future
//! process start can retry; in the current process the failure is memoized
//! by [`NoteStore`](crate::store::NoteStore) and not retried.

use crate::error::{NotesError, NotesResult};
use crate::legacy::LegacyStore;
use crate::models::Note;
use crate::store::DurableBackend;

/// What the migration attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The durable store already had content; legacy data untouched
    AlreadyPopulated,
    /// No usable legacy data existed (absent, unparsable, or empty)
    NothingToImport,
    /// This many notes were imported and the legacy blob was erased
    Imported(usize),
}

/// Import legacy notes into the durable store if needed.
///
/// Callers must serialize invocations; [`NoteStore`](crate::store::NoteStore)
/// does so through its memoized initialization cell.
pub async fn migrate_from_legacy(
    backend: &dyn DurableBackend,
    legacy: &dyn LegacyStore,
) -> NotesResult<MigrationOutcome> {
    if backend.count().await? > 0 {
        return Ok(MigrationOutcome::AlreadyPopulated);
    }

    let Some(raw) = legacy.read() else {
        return Ok(MigrationOutcome::NothingToImport);
    };

    // A deprecated format is not worth failing over: unparsable content is
    // discarded like an empty collection.
    let notes = match parse_legacy_blob(&raw) {
        Ok(notes) => notes,
        Err(e) => {
            tracing::warn!("discarding unreadable legacy notes: {}", e);
            Vec::new()
        }
    };

    if notes.is_empty() {
        if let Err(e) = legacy.clear() {
            tracing::warn!("cannot clear empty legacy store: {}", e);
        }
        return Ok(MigrationOutcome::NothingToImport);
    }

    backend
        .put_batch(&notes)
        .await
        .map_err(|e| NotesError::migration(e.to_string()))?;

    // The batch is durable now; count > 0 blocks any re-import even if this
    // clear fails.
    if let Err(e) = legacy.clear() {
        tracing::warn!("cannot clear legacy store after import: {}", e);
    }

    tracing::info!("imported {} notes from legacy storage", notes.len());
    Ok(MigrationOutcome::Imported(notes.len()))
}

fn parse_legacy_blob(raw: &str) -> NotesResult<Vec<Note>> {
    serde_json::from_str(raw).map_err(|e| NotesError::ParseFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::testing::MemoryLegacyStore;
    use crate::store::testing::MemoryBackend;

    const LEGACY_BLOB: &str =
        r#"[{"id":"a","title":"Old","content":"hi","favorite":false,"createdAt":1,"updatedAt":1}]"#;

    #[tokio::test]
    async fn test_imports_legacy_notes_and_clears_blob() {
        let backend = MemoryBackend::new();
        let legacy = MemoryLegacyStore::with_blob(LEGACY_BLOB);

        let outcome = migrate_from_legacy(&backend, &legacy).await.unwrap();

        assert_eq!(outcome, MigrationOutcome::Imported(1));
        assert!(legacy.is_cleared());
        let imported = backend.get("a").unwrap();
        assert_eq!(imported.title, "Old");
        assert_eq!(imported.content, "hi");
        assert_eq!(imported.created_at, 1);
    }

    #[tokio::test]
    async fn test_populated_store_skips_and_preserves_legacy() {
        let backend = MemoryBackend::new();
        backend.put(&Note::new("existing", "note")).await.unwrap();
        let legacy = MemoryLegacyStore::with_blob(LEGACY_BLOB);

        let outcome = migrate_from_legacy(&backend, &legacy).await.unwrap();

        assert_eq!(outcome, MigrationOutcome::AlreadyPopulated);
        assert!(!legacy.is_cleared());
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_absent_legacy_data_is_noop() {
        let backend = MemoryBackend::new();
        let legacy = MemoryLegacyStore::empty();

        let outcome = migrate_from_legacy(&backend, &legacy).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::NothingToImport);
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_blob_is_discarded() {
        let backend = MemoryBackend::new();
        let legacy = MemoryLegacyStore::with_blob("{not valid json");

        let outcome = migrate_from_legacy(&backend, &legacy).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::NothingToImport);
        assert!(legacy.is_cleared());
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn test_empty_array_clears_legacy_key() {
        let backend = MemoryBackend::new();
        let legacy = MemoryLegacyStore::with_blob("[]");

        let outcome = migrate_from_legacy(&backend, &legacy).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::NothingToImport);
        assert!(legacy.is_cleared());
    }

    #[tokio::test]
    async fn test_failed_batch_preserves_legacy_data() {
        let backend = MemoryBackend::new();
        backend.set_fail_batch(true);
        let legacy = MemoryLegacyStore::with_blob(LEGACY_BLOB);

        let err = migrate_from_legacy(&backend, &legacy).await.unwrap_err();
        assert!(matches!(err, NotesError::MigrationFailed(_)));
        assert!(!legacy.is_cleared());
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let backend = MemoryBackend::new();
        let legacy = MemoryLegacyStore::with_blob(LEGACY_BLOB);

        let first = migrate_from_legacy(&backend, &legacy).await.unwrap();
        assert_eq!(first, MigrationOutcome::Imported(1));

        let second = migrate_from_legacy(&backend, &legacy).await.unwrap();
        assert_eq!(second, MigrationOutcome::AlreadyPopulated);
        assert_eq!(backend.len(), 1);
        assert!(legacy.is_cleared());
    }

    #[tokio::test]
    async fn test_multiple_records_import_in_full() {
        let blob = r#"[
            {"id":"a","title":"One","content":"","favorite":true,"createdAt":1,"updatedAt":3},
            {"id":"b","title":"Two","content":"x","favorite":false,"createdAt":2,"updatedAt":2}
        ]"#;
        let backend = MemoryBackend::new();
        let legacy = MemoryLegacyStore::with_blob(blob);

        let outcome = migrate_from_legacy(&backend, &legacy).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Imported(2));
        assert!(backend.get("a").unwrap().favorite);
        assert_eq!(backend.get("b").unwrap().content, "x");
    }
}
