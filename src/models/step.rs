use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Navigate,
    Click,
    Input,
    Scroll,
    Wait,
}

impl StepType {
    /// Human readable label used by step lists
    pub fn label(&self) -> &'static str {
        match self {
            StepType::Navigate => "Navigate",
            StepType::Click => "Click",
            StepType::Input => "Input",
            StepType::Scroll => "Scroll",
            StepType::Wait => "Wait",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

/// Computed style snapshot taken from a clicked element
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StyleInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

/// Action specific payload. Which fields are set depends on the step type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_info: Option<StyleInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

/// One recorded action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub data: StepData,
}

impl Step {
    /// `HH:MM:SS` in local time
    pub fn formatted_time(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(time) => time.format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }
}

/// A step before the recorder has assigned its id and timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub data: StepData,
}

impl NewStep {
    pub fn navigate(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            step_type: StepType::Navigate,
            data: StepData {
                description: Some(format!("Navigate to {}", url)),
                url: Some(url),
                ..Default::default()
            },
        }
    }

    pub fn input(selector: String, value: String, input_type: Option<&str>) -> Self {
        let field = input_type.filter(|t| !t.is_empty()).unwrap_or("text");
        Self {
            step_type: StepType::Input,
            data: StepData {
                description: Some(format!("Input \"{}\" into {} field", value, field)),
                selector: Some(selector),
                value: Some(value),
                ..Default::default()
            },
        }
    }

    pub fn scroll(selector: String, x: i32, y: i32) -> Self {
        Self {
            step_type: StepType::Scroll,
            data: StepData {
                selector: Some(selector),
                coordinates: Some(Coordinates { x, y }),
                description: Some(format!("Scroll to position ({}, {})", x, y)),
                ..Default::default()
            },
        }
    }

    pub fn wait(duration_ms: u64, description: Option<String>) -> Self {
        Self {
            step_type: StepType::Wait,
            data: StepData {
                value: Some(duration_ms.to_string()),
                description: Some(
                    description
                        .filter(|d| !d.is_empty())
                        .unwrap_or_else(|| format!("Wait for {}ms", duration_ms)),
                ),
                ..Default::default()
            },
        }
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<prefix>_<epoch ms>_<9 char base36 suffix>`
pub fn generate_id(prefix: &str) -> String {
    let random = Uuid::new_v4().as_u128();
    let suffix: String = (0..9)
        .map(|i| BASE36[((random >> (i * 6)) % 36) as usize] as char)
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// Key under which a screenshot blob is stored
pub fn screenshot_id() -> String {
    format!("screenshot_{}", Uuid::new_v4())
}
