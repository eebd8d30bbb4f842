use serde::Serialize;
use std::collections::HashMap;

use super::step::Step;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteRecordingResponse {
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
pub struct ScreenshotsResponse {
    pub screenshots: HashMap<String, String>,
}
