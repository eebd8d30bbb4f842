use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health, recording, screenshots};
use super::state::AppState;
use super::websocket::ws_handler;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Only the local panel UI talks to the recorder
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:1420"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:1420"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
            HeaderValue::from_static("tauri://localhost"),
            HeaderValue::from_static("https://tauri.localhost"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Session lifecycle
        .route("/recording/start", post(recording::start_recording))
        .route("/recording/stop", post(recording::stop_recording))
        .route("/recording/pause", post(recording::pause_recording))
        .route("/recording/resume", post(recording::resume_recording))
        .route("/recording/clear", post(recording::clear_steps))
        .route("/recording/complete", post(recording::complete_recording))
        .route("/recording/status", get(recording::get_recording_status))
        .route("/recording/session", get(recording::get_session))
        // Steps
        .route("/recording/wait", post(recording::add_wait_step))
        .route("/recording/steps/:step_id", delete(recording::delete_step))
        // Screenshot blobs
        .route("/screenshots", get(screenshots::get_screenshots))
        // WebSocket
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
