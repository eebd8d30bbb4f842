use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RecorderError, Result};

/// Runtime configuration for the recorder and its control API
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub port: u16,
    pub host: String,
    /// SQLite file backing the shared session record. `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    /// Quiet period before a scroll burst is recorded
    pub scroll_debounce_ms: u64,
    /// Upper bound on the serialized markup stored with click steps
    pub max_markup_len: usize,
    /// How long the capture overlay stays visible
    pub overlay_hide_ms: u64,
    /// Record the current URL as a navigate step when recording begins
    pub initial_navigation: bool,
}

impl RecorderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("RECORDER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            host: env::var("RECORDER_HOST").unwrap_or(defaults.host),
            db_path: env::var("RECORDER_DB_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .or_else(default_db_path),
            scroll_debounce_ms: env::var("RECORDER_SCROLL_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.scroll_debounce_ms),
            max_markup_len: env::var("RECORDER_MAX_MARKUP_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_markup_len),
            overlay_hide_ms: env::var("RECORDER_OVERLAY_HIDE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.overlay_hide_ms),
            initial_navigation: env::var("RECORDER_INITIAL_NAVIGATION")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.initial_navigation),
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RecorderError::Config("RECORDER_HOST is empty".to_string()));
        }
        if self.port == 0 {
            return Err(RecorderError::Config("RECORDER_PORT must not be 0".to_string()));
        }
        if self.scroll_debounce_ms == 0 {
            return Err(RecorderError::Config(
                "RECORDER_SCROLL_DEBOUNCE_MS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn overlay_hide_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_hide_ms)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            port: 8766,
            host: "127.0.0.1".to_string(),
            db_path: None,
            scroll_debounce_ms: 300,
            max_markup_len: 4096,
            overlay_hide_ms: 1000,
            initial_navigation: false,
        }
    }
}

/// Default location of the shared recording database
fn default_db_path() -> Option<PathBuf> {
    let data_dir = dirs::data_dir()?;
    Some(data_dir.join("com.tasker.app").join("recording.db"))
}
