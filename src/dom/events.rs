use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Input,
    Scroll,
    Load,
    PopState,
}

/// Where a scroll event originated
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    /// The page itself scrolled (`window` scroll offsets apply)
    Document,
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    Click {
        target: Element,
        client_x: i32,
        client_y: i32,
    },
    Input {
        target: Element,
    },
    Scroll {
        target: ScrollTarget,
    },
    Load,
    PopState,
}

impl DomEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            DomEvent::Click { .. } => EventType::Click,
            DomEvent::Input { .. } => EventType::Input,
            DomEvent::Scroll { .. } => EventType::Scroll,
            DomEvent::Load => EventType::Load,
            DomEvent::PopState => EventType::PopState,
        }
    }
}

pub type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    event_type: EventType,
    capture: bool,
    listener: Listener,
}

/// Listeners registered on one event target (document or window)
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub fn add(&self, event_type: EventType, capture: bool, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push(ListenerEntry {
            id,
            event_type,
            capture,
            listener,
        });
        id
    }

    /// Returns false if the listener was already gone
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .count()
    }

    /// Capture-phase listeners run before bubble-phase ones, each group in
    /// registration order. Listeners are invoked outside the registry lock so
    /// they may add or remove listeners themselves.
    pub fn dispatch(&self, event: &DomEvent) {
        let event_type = event.event_type();
        let (capture, bubble): (Vec<_>, Vec<_>) = self
            .entries
            .read()
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .map(|entry| (entry.capture, Arc::clone(&entry.listener)))
            .partition(|(capture, _)| *capture);

        for (_, listener) in capture.into_iter().chain(bubble) {
            listener(event);
        }
    }
}
