use serde::{Deserialize, Serialize};

use super::step::{generate_id, NewStep, Step};

/// The shared recording record. Every context reads and writes this one value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSession {
    #[serde(default)]
    pub is_recording: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub current_step_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl RecordingSession {
    /// True while steps are accepted
    pub fn is_active(&self) -> bool {
        self.is_recording && !self.is_paused
    }

    pub fn status(&self) -> RecordingStatus {
        RecordingStatus {
            is_recording: self.is_recording,
            is_paused: self.is_paused,
            step_count: self.steps.len(),
        }
    }

    /// Begin a fresh session, discarding whatever was there before
    pub fn start(&mut self, now_ms: i64) {
        *self = Self {
            is_recording: true,
            is_paused: false,
            steps: Vec::new(),
            start_time: Some(now_ms),
            current_step_id: None,
            session_id: Some(generate_id("recording")),
        };
    }

    /// Returns false when there was nothing to pause
    pub fn pause(&mut self) -> bool {
        if !self.is_recording {
            return false;
        }
        self.is_paused = true;
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.is_recording {
            return false;
        }
        self.is_paused = false;
        true
    }

    /// Append a step if the session is recording and not paused.
    ///
    /// The timestamp never goes below the previous step's, so the log stays
    /// ordered even if the wall clock steps backwards.
    pub fn append(&mut self, new_step: NewStep, now_ms: i64) -> Option<Step> {
        if !self.is_active() {
            return None;
        }

        let timestamp = self
            .steps
            .last()
            .map(|last| last.timestamp.max(now_ms))
            .unwrap_or(now_ms);

        let step = Step {
            id: generate_id("step"),
            step_type: new_step.step_type,
            timestamp,
            data: new_step.data,
        };

        self.current_step_id = Some(step.id.clone());
        self.steps.push(step.clone());
        Some(step)
    }

    /// Returns true if a step was removed
    pub fn delete_step(&mut self, step_id: &str) -> bool {
        let before = self.steps.len();
        self.steps.retain(|step| step.id != step_id);
        self.steps.len() != before
    }

    pub fn clear_steps(&mut self) {
        self.steps.clear();
        self.current_step_id = None;
    }

    /// Back to idle with everything cleared
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Hand back the recorded steps and reset
    pub fn complete(&mut self) -> Vec<Step> {
        let steps = std::mem::take(&mut self.steps);
        self.reset();
        steps
    }

    /// Merge a partial update into this record
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(is_recording) = patch.is_recording {
            self.is_recording = is_recording;
        }
        if let Some(is_paused) = patch.is_paused {
            self.is_paused = is_paused;
        }
        if let Some(steps) = patch.steps {
            self.steps = steps;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(current_step_id) = patch.current_step_id {
            self.current_step_id = current_step_id;
        }
        if let Some(session_id) = patch.session_id {
            self.session_id = session_id;
        }
    }
}

/// Partial update for [`RecordingSession`]. `None` leaves a field untouched;
/// the nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recording: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Option<String>>,
}

impl From<RecordingSession> for SessionPatch {
    fn from(session: RecordingSession) -> Self {
        Self {
            is_recording: Some(session.is_recording),
            is_paused: Some(session.is_paused),
            steps: Some(session.steps),
            start_time: Some(session.start_time),
            current_step_id: Some(session.current_step_id),
            session_id: Some(session.session_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStatus {
    pub is_recording: bool,
    pub is_paused: bool,
    pub step_count: usize,
}
