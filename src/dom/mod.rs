//! In-memory page model the recorder observes.

pub mod element;
pub mod events;
pub mod history;
pub mod window;

pub use element::{Document, Element, RasterData, Rect};
pub use events::{DomEvent, EventType, Listener, ListenerId, ListenerRegistry, ScrollTarget};
pub use history::{History, HistoryMutator, HistoryState};
pub use window::{ListenerTarget, Window};
