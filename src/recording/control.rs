use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use super::session::SessionManager;
use crate::error::Result;
use crate::models::{NewStep, RecordingSession, RecordingStatus, Step};
use crate::store::ScreenshotStore;

/// Commands the panel UI issues against the shared session
pub struct RecorderControl {
    session: Arc<SessionManager>,
    screenshots: Arc<dyn ScreenshotStore>,
}

impl RecorderControl {
    pub fn new(session: Arc<SessionManager>, screenshots: Arc<dyn ScreenshotStore>) -> Self {
        Self {
            session,
            screenshots,
        }
    }

    pub async fn start_recording(&self) -> RecordingSession {
        self.session.start().await
    }

    pub async fn stop_recording(&self) {
        self.session.stop().await
    }

    pub async fn pause_recording(&self) {
        self.session.pause().await
    }

    pub async fn resume_recording(&self) {
        self.session.resume().await
    }

    pub async fn clear_steps(&self) {
        self.session.clear_steps().await
    }

    pub async fn complete_recording(&self) -> Vec<Step> {
        self.session.complete().await
    }

    pub async fn delete_step(&self, step_id: &str) {
        self.session.delete_step(step_id).await
    }

    /// Record a deliberate pause. Ignored unless recording and not paused.
    pub async fn add_wait_step(&self, duration_ms: u64, description: Option<String>) -> Option<Step> {
        self.session.add_step(NewStep::wait(duration_ms, description)).await
    }

    pub async fn recording_status(&self) -> RecordingStatus {
        self.session.status().await
    }

    pub async fn session(&self) -> RecordingSession {
        self.session.session().await
    }

    pub fn subscribe(&self) -> watch::Receiver<RecordingSession> {
        self.session.subscribe()
    }

    /// Screenshot blobs for the given ids; missing ids are left out
    pub async fn screenshots(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        self.screenshots.get_many(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepType;
    use crate::store::{MemoryScreenshotStore, MemoryStore};

    fn control() -> RecorderControl {
        RecorderControl::new(
            Arc::new(SessionManager::new(Arc::new(MemoryStore::new()))),
            Arc::new(MemoryScreenshotStore::new()),
        )
    }

    #[tokio::test]
    async fn test_wait_step_only_while_recording() {
        let control = control();
        assert!(control.add_wait_step(500, None).await.is_none());

        control.start_recording().await;
        let step = control
            .add_wait_step(500, Some("Let the chart render".to_string()))
            .await
            .unwrap();
        assert_eq!(step.step_type, StepType::Wait);
        assert_eq!(step.data.value.as_deref(), Some("500"));
        assert_eq!(step.data.description.as_deref(), Some("Let the chart render"));

        control.pause_recording().await;
        assert!(control.add_wait_step(100, None).await.is_none());
        assert_eq!(control.recording_status().await.step_count, 1);
    }

    #[tokio::test]
    async fn test_stop_discards_steps() {
        let control = control();
        control.start_recording().await;
        control.add_wait_step(1, None).await;
        control.stop_recording().await;

        let status = control.recording_status().await;
        assert!(!status.is_recording);
        assert_eq!(status.step_count, 0);
    }
}
