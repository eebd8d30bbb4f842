//! Recording lifecycle over the shared store
//!
//! Every mutation reads the current record, computes the next one and writes
//! it back. There is no lock across contexts: two contexts appending in the
//! same instant can race and the last write wins. Only the page context
//! produces DOM-driven steps, so in practice the window is narrow.
//!
//! Storage failures are logged and swallowed so a storage hiccup never stops
//! a recording or surfaces inside the page.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::{NewStep, RecordingSession, RecordingStatus, Step};
use crate::store::StepStore;

pub struct SessionManager {
    store: Arc<dyn StepStore>,
    live: watch::Receiver<RecordingSession>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn StepStore>) -> Self {
        let live = store.subscribe();
        Self { store, live }
    }

    pub fn store(&self) -> &Arc<dyn StepStore> {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<RecordingSession> {
        self.store.subscribe()
    }

    /// Gate check against the latest record this context has seen, without
    /// touching storage
    pub fn is_active_now(&self) -> bool {
        self.live.borrow().is_active()
    }

    async fn read(&self) -> Option<RecordingSession> {
        match self.store.get().await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::error!("Failed to read recording session: {}", e);
                None
            }
        }
    }

    async fn write(&self, session: RecordingSession) {
        if let Err(e) = self.store.set(session.into()).await {
            tracing::error!("Failed to write recording session: {}", e);
        }
    }

    /// Current record, or an idle one if storage is unreadable
    pub async fn session(&self) -> RecordingSession {
        self.read().await.unwrap_or_default()
    }

    pub async fn status(&self) -> RecordingStatus {
        self.session().await.status()
    }

    /// Start a fresh session regardless of what was there before
    pub async fn start(&self) -> RecordingSession {
        let mut session = RecordingSession::default();
        session.start(Utc::now().timestamp_millis());
        self.write(session.clone()).await;
        tracing::info!(
            "Recording started: {}",
            session.session_id.as_deref().unwrap_or_default()
        );
        session
    }

    pub async fn stop(&self) {
        self.write(RecordingSession::default()).await;
        tracing::info!("Recording stopped");
    }

    pub async fn pause(&self) {
        let Some(mut session) = self.read().await else {
            return;
        };
        if session.pause() {
            self.write(session).await;
            tracing::info!("Recording paused");
        }
    }

    pub async fn resume(&self) {
        let Some(mut session) = self.read().await else {
            return;
        };
        if session.resume() {
            self.write(session).await;
            tracing::info!("Recording resumed");
        }
    }

    /// Append a step when recording and not paused. Returns the step as
    /// appended, even if persisting it failed.
    pub async fn add_step(&self, new_step: NewStep) -> Option<Step> {
        let mut session = self.read().await?;
        let step = session.append(new_step, Utc::now().timestamp_millis())?;
        tracing::debug!(
            "Step {} ({}) recorded, {} total",
            step.id,
            step.step_type.label(),
            session.steps.len()
        );
        self.write(session).await;
        Some(step)
    }

    pub async fn delete_step(&self, step_id: &str) {
        let Some(mut session) = self.read().await else {
            return;
        };
        if session.delete_step(step_id) {
            self.write(session).await;
            tracing::debug!("Deleted step {}", step_id);
        }
    }

    pub async fn clear_steps(&self) {
        let Some(mut session) = self.read().await else {
            return;
        };
        session.clear_steps();
        self.write(session).await;
    }

    /// Hand back the recorded steps and return to idle
    pub async fn complete(&self) -> Vec<Step> {
        let mut session = self.session().await;
        let steps = session.complete();
        self.write(session).await;
        tracing::info!("Recording completed with {} steps", steps.len());
        steps
    }
}
