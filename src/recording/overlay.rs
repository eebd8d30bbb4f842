use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub is_visible: bool,
}

/// "Capturing" indicator shown while a click is being captured
pub struct CaptureOverlay {
    state: Arc<watch::Sender<OverlayState>>,
    hide_task: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureOverlay {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(OverlayState::default());
        Self {
            state: Arc::new(tx),
            hide_task: Mutex::new(None),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().is_visible
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.state.subscribe()
    }

    pub fn show(&self) {
        self.cancel_pending_hide();
        self.set_visible(true);
    }

    pub fn hide(&self) {
        self.cancel_pending_hide();
        self.set_visible(false);
    }

    /// Show now and hide after `delay`. A later call restarts the delay.
    pub fn show_then_hide(&self, delay: Duration) {
        self.show();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_if_modified(|s| std::mem::replace(&mut s.is_visible, false));
        });
        *self.hide_task.lock() = Some(task);
    }

    fn set_visible(&self, visible: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.is_visible != visible;
            s.is_visible = visible;
            changed
        });
    }

    fn cancel_pending_hide(&self) {
        if let Some(task) = self.hide_task.lock().take() {
            task.abort();
        }
    }
}

impl Default for CaptureOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureOverlay {
    fn drop(&mut self) {
        self.cancel_pending_hide();
    }
}
