use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AddWaitStepRequest {
    pub duration_ms: u64,
    #[serde(default)]
    pub description: Option<String>,
}

/// `?ids=screenshot_a,screenshot_b`
#[derive(Debug, Deserialize)]
pub struct ScreenshotQuery {
    #[serde(default)]
    pub ids: String,
}

impl ScreenshotQuery {
    pub fn id_list(&self) -> Vec<String> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}
