//! NoteCore - local-first persistence and state synchronization for a
//! note-taking application.
//!
//! This library owns the canonical note collection and keeps it consistent
//! between memory and durable storage:
//! - Data model (Note, NotePatch)
//! - Durable storage (SQLite) behind the [`store::NoteStore`] interface
//! - One-time migration from the legacy single-blob format
//! - Reactive synchronizer: optimistic in-memory mutations mirrored
//!   asynchronously to the store
//!
//! Presentation, routing, and user intent all live in the host application;
//! the host calls [`sync::NoteSynchronizer`] for mutations and views, and
//! decides selection/editor state from the ids this library returns.

pub mod config;
pub mod database;
pub mod error;
pub mod legacy;
pub mod migrate;
pub mod models;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::StoreConfig;
pub use database::SqliteBackend;
pub use error::{NotesError, NotesResult};
pub use legacy::{FileLegacyStore, LegacyStore};
pub use migrate::MigrationOutcome;
pub use models::{Note, NotePatch, UNTITLED};
pub use store::{DurableBackend, NoteStore};
pub use sync::NoteSynchronizer;
