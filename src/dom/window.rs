use parking_lot::RwLock;

use super::element::{Document, Element};
use super::events::{DomEvent, EventType, Listener, ListenerId, ListenerRegistry, ScrollTarget};
use super::history::History;

/// Which object a listener is registered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Document,
    Window,
}

/// A top-level browsing context: document, location, history, scroll
/// position and the two listener registries.
///
/// The `click`/`type_text`/`scroll_*`/`navigate` helpers are what a host
/// bridge calls to replay what the user did in the real page; they mutate
/// state first and then dispatch, like the browser does.
pub struct Window {
    document: Document,
    history: History,
    scroll: RwLock<(i32, i32)>,
    device_pixel_ratio: RwLock<f64>,
    document_listeners: ListenerRegistry,
    window_listeners: ListenerRegistry,
}

impl Window {
    pub fn new(url: &str) -> Self {
        Self {
            document: Document::new(),
            history: History::new(url),
            scroll: RwLock::new((0, 0)),
            device_pixel_ratio: RwLock::new(1.0),
            document_listeners: ListenerRegistry::default(),
            window_listeners: ListenerRegistry::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current `location.href`
    pub fn location(&self) -> String {
        self.history.state().location()
    }

    /// `(pageXOffset, pageYOffset)`
    pub fn scroll_offset(&self) -> (i32, i32) {
        *self.scroll.read()
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        *self.device_pixel_ratio.read()
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        *self.device_pixel_ratio.write() = ratio;
    }

    pub fn add_event_listener(
        &self,
        target: ListenerTarget,
        event_type: EventType,
        capture: bool,
        listener: Listener,
    ) -> ListenerId {
        self.registry(target).add(event_type, capture, listener)
    }

    pub fn remove_event_listener(&self, target: ListenerTarget, id: ListenerId) -> bool {
        self.registry(target).remove(id)
    }

    pub fn listener_count(&self, target: ListenerTarget) -> usize {
        self.registry(target).len()
    }

    fn registry(&self, target: ListenerTarget) -> &ListenerRegistry {
        match target {
            ListenerTarget::Document => &self.document_listeners,
            ListenerTarget::Window => &self.window_listeners,
        }
    }

    /// Route an event to the registry that would receive it in a browser
    pub fn dispatch(&self, event: DomEvent) {
        match event {
            DomEvent::Load | DomEvent::PopState => self.window_listeners.dispatch(&event),
            _ => self.document_listeners.dispatch(&event),
        }
    }

    pub fn click(&self, target: &Element, client_x: i32, client_y: i32) {
        self.dispatch(DomEvent::Click {
            target: target.clone(),
            client_x,
            client_y,
        });
    }

    /// Set a field's value and fire `input`
    pub fn type_text(&self, target: &Element, value: &str) {
        target.set_value(value);
        self.dispatch(DomEvent::Input {
            target: target.clone(),
        });
    }

    pub fn scroll_to(&self, x: i32, y: i32) {
        *self.scroll.write() = (x, y);
        self.dispatch(DomEvent::Scroll {
            target: ScrollTarget::Document,
        });
    }

    pub fn scroll_element_to(&self, target: &Element, left: i32, top: i32) {
        target.set_scroll_offset(left, top);
        self.dispatch(DomEvent::Scroll {
            target: ScrollTarget::Element(target.clone()),
        });
    }

    /// Full page navigation: new history entry, scroll reset, `load`
    pub fn navigate(&self, url: &str) {
        self.history.state().push_entry(url);
        *self.scroll.write() = (0, 0);
        self.dispatch(DomEvent::Load);
    }

    /// Traverse history and fire `popstate`; no-op at either end
    pub fn go(&self, delta: isize) {
        if self.history.state().go(delta).is_some() {
            self.dispatch(DomEvent::PopState);
        }
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_dispatch_routes_by_target() {
        let window = Window::new("https://app.test/");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        window.add_event_listener(
            ListenerTarget::Document,
            EventType::Click,
            true,
            Arc::new(move |_: &DomEvent| s.lock().push("document click")),
        );
        let s = Arc::clone(&seen);
        window.add_event_listener(
            ListenerTarget::Window,
            EventType::PopState,
            false,
            Arc::new(move |_: &DomEvent| s.lock().push("popstate")),
        );

        let button = Element::new("button");
        window.document().body().append_child(&button);
        window.click(&button, 1, 2);
        window.history().push_state("/next");
        window.back();

        assert_eq!(*seen.lock(), vec!["document click", "popstate"]);
        assert_eq!(window.location(), "https://app.test/");
    }

    #[test]
    fn test_back_at_start_does_not_fire() {
        let window = Window::new("https://app.test/");
        let fired = Arc::new(Mutex::new(0));
        let f = Arc::clone(&fired);
        window.add_event_listener(
            ListenerTarget::Window,
            EventType::PopState,
            false,
            Arc::new(move |_: &DomEvent| *f.lock() += 1),
        );
        window.back();
        assert_eq!(*fired.lock(), 0);
    }

    #[test]
    fn test_type_text_sets_value() {
        let window = Window::new("about:blank");
        let input = Element::new("input");
        window.type_text(&input, "hello");
        assert_eq!(input.value().as_deref(), Some("hello"));
    }
}
