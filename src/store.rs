//! Persistent store interface.
//!
//! [`NoteStore`] is the single durable-storage surface the rest of the
//! system talks to. It lazily opens the backend and runs the one-time
//! legacy migration before the first real read or write. The initialization
//! is memoized: concurrent first callers share one in-flight attempt, and a
//! failed attempt is replayed to later callers instead of being retried
//! within the same process. A fresh process start retries naturally, since
//! a failed migration leaves the legacy data intact.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::config::StoreConfig;
use crate::database::SqliteBackend;
use crate::error::{NotesError, NotesResult};
use crate::legacy::{FileLegacyStore, LegacyStore};
use crate::migrate::migrate_from_legacy;
use crate::models::Note;

/// Asynchronous record storage keyed by note id.
///
/// Implementations must make each call atomic: a concurrent read never
/// observes a partially-written record.
#[async_trait]
pub trait DurableBackend: Send + Sync {
    /// Number of records currently stored
    async fn count(&self) -> NotesResult<u64>;

    /// All records, in unspecified order
    async fn read_all(&self) -> NotesResult<Vec<Note>>;

    /// Write or overwrite the record at `note.id`
    async fn put(&self, note: &Note) -> NotesResult<()>;

    /// Write all records in one all-or-nothing batch
    async fn put_batch(&self, notes: &[Note]) -> NotesResult<()>;

    /// Delete the record at `id`; absent id is a no-op
    async fn delete(&self, id: &str) -> NotesResult<()>;
}

enum BackendSource {
    /// Open a SQLite database at this path on first use
    Path(PathBuf),
    /// Backend supplied by the host (tests, alternative engines)
    Ready(Arc<dyn DurableBackend>),
}

/// The durable store handle shared process-wide.
///
/// Construction is cheap and infallible; all real work happens on first
/// access. Clone the surrounding `Arc` to share it.
pub struct NoteStore {
    source: BackendSource,
    legacy: Arc<dyn LegacyStore>,
    ready: OnceCell<Result<Arc<dyn DurableBackend>, NotesError>>,
}

impl NoteStore {
    /// Create a store over the SQLite database and legacy file named by the
    /// configuration.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            source: BackendSource::Path(config.database_path()),
            legacy: Arc::new(FileLegacyStore::new(config.legacy_path())),
            ready: OnceCell::new(),
        }
    }

    /// Create a store over an injected backend and legacy store.
    pub fn with_backend(backend: Arc<dyn DurableBackend>, legacy: Arc<dyn LegacyStore>) -> Self {
        Self {
            source: BackendSource::Ready(backend),
            legacy,
            ready: OnceCell::new(),
        }
    }

    /// Force initialization: open the backend and run the legacy migration.
    ///
    /// Idempotent; concurrent callers await the same in-flight setup. Every
    /// accessor calls this implicitly, so calling it up front is optional.
    pub async fn open(&self) -> NotesResult<()> {
        self.ready().await.map(|_| ())
    }

    /// All notes currently in durable storage, in unspecified order.
    pub async fn read_all(&self) -> NotesResult<Vec<Note>> {
        let backend = self.ready().await?;
        backend.read_all().await
    }

    /// Write or overwrite the full record at `note.id`.
    ///
    /// The title is normalized at this point: an empty title is stored as
    /// the `"Untitled"` placeholder.
    pub async fn upsert(&self, note: &Note) -> NotesResult<()> {
        let backend = self.ready().await?;
        let mut record = note.clone();
        record.title = record.saved_title().to_string();
        backend.put(&record).await
    }

    /// Delete the record at `id` if present; a no-op otherwise.
    pub async fn remove(&self, id: &str) -> NotesResult<()> {
        let backend = self.ready().await?;
        backend.delete(id).await
    }

    async fn ready(&self) -> NotesResult<Arc<dyn DurableBackend>> {
        self.ready
            .get_or_init(|| async {
                let backend: Arc<dyn DurableBackend> = match &self.source {
                    BackendSource::Path(path) => Arc::new(SqliteBackend::open(path)?),
                    BackendSource::Ready(backend) => Arc::clone(backend),
                };
                migrate_from_legacy(backend.as_ref(), self.legacy.as_ref()).await?;
                Ok(backend)
            })
            .await
            .clone()
    }
}

/// In-memory backend with fault injection, for tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::error::NotesError;

    #[derive(Default)]
    pub(crate) struct MemoryBackend {
        notes: Mutex<BTreeMap<String, Note>>,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        fail_batch: AtomicBool,
        batch_calls: AtomicUsize,
    }

    impl MemoryBackend {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn set_fail_batch(&self, fail: bool) {
            self.fail_batch.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn batch_calls(&self) -> usize {
            self.batch_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn get(&self, id: &str) -> Option<Note> {
            self.notes.lock().unwrap().get(id).cloned()
        }

        pub(crate) fn len(&self) -> usize {
            self.notes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DurableBackend for MemoryBackend {
        async fn count(&self) -> NotesResult<u64> {
            Ok(self.notes.lock().unwrap().len() as u64)
        }

        async fn read_all(&self) -> NotesResult<Vec<Note>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(NotesError::unavailable("injected read failure"));
            }
            Ok(self.notes.lock().unwrap().values().cloned().collect())
        }

        async fn put(&self, note: &Note) -> NotesResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(NotesError::write_failed(&note.id, "injected write failure"));
            }
            self.notes
                .lock()
                .unwrap()
                .insert(note.id.clone(), note.clone());
            Ok(())
        }

        async fn put_batch(&self, notes: &[Note]) -> NotesResult<()> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_batch.load(Ordering::SeqCst) {
                return Err(NotesError::unavailable("injected batch failure"));
            }
            let mut map = self.notes.lock().unwrap();
            for note in notes {
                map.insert(note.id.clone(), note.clone());
            }
            Ok(())
        }

        async fn delete(&self, id: &str) -> NotesResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(NotesError::write_failed(id, "injected write failure"));
            }
            self.notes.lock().unwrap().remove(id);
            Ok(())
        }
    }
}
