//! Storage contracts shared by every execution context
//!
//! The session record is small and synchronized live; screenshot blobs live
//! in a separate keyed store and are fetched lazily by id.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{RecordingSession, SessionPatch};

pub use memory::{MemoryScreenshotStore, MemoryStore};
pub use sqlite::SqliteStore;

/// Durable, subscribable home of the [`RecordingSession`] record
#[async_trait]
pub trait StepStore: Send + Sync {
    async fn get(&self) -> Result<RecordingSession>;

    /// Merge `patch` into the stored record and notify subscribers
    async fn set(&self, patch: SessionPatch) -> Result<()>;

    /// Live view of the record. `borrow()` is always the latest value this
    /// process knows about.
    fn subscribe(&self) -> watch::Receiver<RecordingSession>;
}

/// Keyed data-URI blobs
#[async_trait]
pub trait ScreenshotStore: Send + Sync {
    async fn set(&self, id: &str, data_uri: String) -> Result<()>;

    /// Missing ids are simply absent from the result
    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, String>>;
}
