use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::watch;

use super::{ScreenshotStore, StepStore};
use crate::error::Result;
use crate::models::{RecordingSession, SessionPatch};

/// Process-local session record. The watch channel is the storage.
pub struct MemoryStore {
    session: watch::Sender<RecordingSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RecordingSession::default());
        Self { session: tx }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepStore for MemoryStore {
    async fn get(&self) -> Result<RecordingSession> {
        Ok(self.session.borrow().clone())
    }

    async fn set(&self, patch: SessionPatch) -> Result<()> {
        self.session.send_modify(|session| session.apply(patch));
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<RecordingSession> {
        self.session.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryScreenshotStore {
    blobs: DashMap<String, String>,
}

impl MemoryScreenshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl ScreenshotStore for MemoryScreenshotStore {
    async fn set(&self, id: &str, data_uri: String) -> Result<()> {
        self.blobs.insert(id.to_string(), data_uri);
        Ok(())
    }

    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.blobs.get(id).map(|blob| (id.clone(), blob.value().clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_merges_and_notifies() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store
            .set(SessionPatch {
                is_recording: Some(true),
                session_id: Some(Some("recording_1_abc".to_string())),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_recording);

        store
            .set(SessionPatch {
                is_paused: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let session = store.get().await.unwrap();
        assert!(session.is_recording);
        assert!(session.is_paused);
        assert_eq!(session.session_id.as_deref(), Some("recording_1_abc"));
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let store = MemoryScreenshotStore::new();
        store.set("screenshot_a", "data:a".to_string()).await.unwrap();

        let found = store
            .get_many(&["screenshot_a".to_string(), "screenshot_b".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["screenshot_a"], "data:a");
    }
}
