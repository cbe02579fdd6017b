//! Legacy single-blob storage.
//!
//! The earlier storage format kept the whole note collection as one
//! serialized JSON array under a well-known key in a synchronous store.
//! This module abstracts that surface so the migration manager can consume
//! it exactly once, and provides the file-backed implementation used in
//! production.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Synchronous access to the legacy blob location.
///
/// The blob either exists in full or is absent; there is no partial state.
pub trait LegacyStore: Send + Sync {
    /// Read the raw blob, or `None` when the location is absent or
    /// unreadable. The legacy format is deprecated, so any read problem is
    /// treated as "no legacy data".
    fn read(&self) -> Option<String>;

    /// Erase the blob so migration never re-runs. Idempotent: clearing an
    /// absent location succeeds.
    fn clear(&self) -> io::Result<()>;
}

/// Legacy store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileLegacyStore {
    path: PathBuf,
}

impl FileLegacyStore {
    /// Create a legacy store reading from the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LegacyStore for FileLegacyStore {
    fn read(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("cannot read legacy store {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory legacy store for tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub(crate) struct MemoryLegacyStore {
        blob: Mutex<Option<String>>,
    }

    impl MemoryLegacyStore {
        pub(crate) fn empty() -> Self {
            Self::default()
        }

        pub(crate) fn with_blob(blob: impl Into<String>) -> Self {
            Self {
                blob: Mutex::new(Some(blob.into())),
            }
        }

        pub(crate) fn is_cleared(&self) -> bool {
            self.blob.lock().unwrap().is_none()
        }
    }

    impl LegacyStore for MemoryLegacyStore {
        fn read(&self) -> Option<String> {
            self.blob.lock().unwrap().clone()
        }

        fn clear(&self) -> io::Result<()> {
            *self.blob.lock().unwrap() = None;
            Ok(())
        }
    }
}
