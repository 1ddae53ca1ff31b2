//! Save/load persistence and remote sync
//!
//! Features:
//! - Versioned JSON snapshot of settings, profile and the game in progress
//! - Migration: pre-v3 saves keep their settings and lose progress
//! - Sanitization on load (settings clamped, unknown characters dropped)
//! - Local/remote merge and a debounced remote writer
//! - Append-only log of finished games

pub mod session_log;
pub mod snapshot;
pub mod sync;

pub use session_log::{
    MemorySessionLog, SESSION_LOG_KEY, SessionLog, SessionRecord, StoreSessionLog,
};
pub use snapshot::{SNAPSHOT_VERSION, STORAGE_KEY, SessionSnapshot, SnapshotStore, merge};
pub use sync::{DebouncedSync, SyncStatus};

use thiserror::Error;

use crate::platform::StorageError;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
