//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, files on native, memory for tests)
//! - Wall-clock time

pub mod storage;
pub mod time;

pub use storage::{KeyValueStore, MemoryStore, StorageError};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use time::now_ms;
