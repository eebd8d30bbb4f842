//! Interaction recorder for Tasker workflows.
//!
//! The recorder has two halves that share one session record through a
//! [`store::StepStore`]:
//!
//! - the page side, a [`recording::CaptureEngine`] living next to the
//!   [`dom::Window`] a host bridge keeps in sync with the real page, which
//!   turns clicks, input, scrolls and URL changes into steps;
//! - the panel side, a [`recording::RecorderControl`] that starts, pauses and
//!   completes sessions. The `tasker-recorder` binary serves this half over
//!   HTTP and WebSocket.
//!
//! The binary does not host a page. A host embeds the library, builds the
//! window and engine against the same store the server uses (the SQLite file
//! when running across processes) and dispatches page events into it:
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tasker_recorder::dom::{Element, Window};
//! use tasker_recorder::recording::{CaptureContext, CaptureEngine, RecorderControl, SessionManager};
//! use tasker_recorder::store::{MemoryScreenshotStore, MemoryStore, ScreenshotStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let window = Arc::new(Window::new("https://app.test/"));
//! let session = Arc::new(SessionManager::new(Arc::new(MemoryStore::new())));
//! let screenshots: Arc<dyn ScreenshotStore> = Arc::new(MemoryScreenshotStore::new());
//! let control = RecorderControl::new(Arc::clone(&session), Arc::clone(&screenshots));
//!
//! let engine = CaptureEngine::new(CaptureContext::new(Arc::clone(&window), session, screenshots));
//! engine.initialize();
//!
//! let button = Element::new("button").with_id("save");
//! window.document().body().append_child(&button);
//!
//! control.start_recording().await;
//! window.click(&button, 12, 8);
//! tokio::time::sleep(Duration::from_millis(50)).await;
//!
//! let steps = control.complete_recording().await;
//! assert_eq!(steps[0].data.selector.as_deref(), Some("#save"));
//! # }
//! ```

pub mod api;
pub mod config;
pub mod dom;
pub mod error;
pub mod models;
pub mod recording;
pub mod store;
