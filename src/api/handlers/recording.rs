use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::error::{RecorderError, Result};
use crate::models::{
    AddWaitStepRequest, CompleteRecordingResponse, RecordingSession, RecordingStatus, Step,
};

use super::super::state::AppState;

/// Start a fresh session, discarding whatever was recorded before
pub async fn start_recording(State(state): State<Arc<AppState>>) -> Json<RecordingSession> {
    Json(state.control.start_recording().await)
}

/// Stop and discard the steps. Use `complete` to keep them.
pub async fn stop_recording(State(state): State<Arc<AppState>>) -> StatusCode {
    state.control.stop_recording().await;
    StatusCode::NO_CONTENT
}

pub async fn pause_recording(State(state): State<Arc<AppState>>) -> Json<RecordingStatus> {
    state.control.pause_recording().await;
    Json(state.control.recording_status().await)
}

pub async fn resume_recording(State(state): State<Arc<AppState>>) -> Json<RecordingStatus> {
    state.control.resume_recording().await;
    Json(state.control.recording_status().await)
}

pub async fn clear_steps(State(state): State<Arc<AppState>>) -> Json<RecordingStatus> {
    state.control.clear_steps().await;
    Json(state.control.recording_status().await)
}

pub async fn complete_recording(
    State(state): State<Arc<AppState>>,
) -> Json<CompleteRecordingResponse> {
    let steps = state.control.complete_recording().await;
    Json(CompleteRecordingResponse { steps })
}

pub async fn get_recording_status(State(state): State<Arc<AppState>>) -> Json<RecordingStatus> {
    Json(state.control.recording_status().await)
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<RecordingSession> {
    Json(state.control.session().await)
}

pub async fn delete_step(
    State(state): State<Arc<AppState>>,
    Path(step_id): Path<String>,
) -> StatusCode {
    state.control.delete_step(&step_id).await;
    StatusCode::NO_CONTENT
}

/// Append a wait step. 409 when the session is not actively recording.
pub async fn add_wait_step(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddWaitStepRequest>,
) -> Result<(StatusCode, Json<Step>)> {
    if request.duration_ms == 0 {
        return Err(RecorderError::ValidationError(
            "duration_ms must be greater than zero".to_string(),
        ));
    }

    match state
        .control
        .add_wait_step(request.duration_ms, request.description)
        .await
    {
        Some(step) => Ok((StatusCode::CREATED, Json(step))),
        None => Err(RecorderError::NotRecording),
    }
}
