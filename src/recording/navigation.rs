//! URL change detection
//!
//! Single page apps change the URL through `pushState`/`replaceState`
//! without a browser navigation event, so besides listening for `load` and
//! `popstate` the interceptor wraps both history mutators. The wrappers are
//! removed, and the originals reinstated, when the interceptor is restored or
//! dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::dom::{DomEvent, EventType, HistoryMutator, HistoryState, ListenerId, ListenerTarget, Window};

/// Called with the new `location.href`
pub type NavigationCallback = Arc<dyn Fn(String) + Send + Sync>;

pub struct NavigationInterceptor {
    window: Weak<Window>,
    original_push: HistoryMutator,
    original_replace: HistoryMutator,
    load_listener: ListenerId,
    popstate_listener: ListenerId,
    restored: AtomicBool,
}

impl NavigationInterceptor {
    pub fn install(window: &Arc<Window>, on_navigate: NavigationCallback) -> Self {
        let history = window.history();

        let original_push = history.push_mutator();
        history.set_push_mutator(wrap(Arc::clone(&original_push), Arc::clone(&on_navigate)));

        let original_replace = history.replace_mutator();
        history.set_replace_mutator(wrap(Arc::clone(&original_replace), Arc::clone(&on_navigate)));

        let weak = Arc::downgrade(window);
        let notify = Arc::clone(&on_navigate);
        let load_listener = window.add_event_listener(
            ListenerTarget::Window,
            EventType::Load,
            false,
            Arc::new(move |_: &DomEvent| {
                if let Some(window) = weak.upgrade() {
                    notify(window.location());
                }
            }),
        );

        let weak = Arc::downgrade(window);
        let notify = on_navigate;
        let popstate_listener = window.add_event_listener(
            ListenerTarget::Window,
            EventType::PopState,
            false,
            Arc::new(move |_: &DomEvent| {
                if let Some(window) = weak.upgrade() {
                    notify(window.location());
                }
            }),
        );

        tracing::debug!("Navigation interceptor installed on {}", window.location());

        Self {
            window: Arc::downgrade(window),
            original_push,
            original_replace,
            load_listener,
            popstate_listener,
            restored: AtomicBool::new(false),
        }
    }

    /// Put the original mutators back and remove both listeners. Idempotent.
    pub fn restore(&self) {
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(window) = self.window.upgrade() else {
            return;
        };

        let history = window.history();
        history.set_push_mutator(Arc::clone(&self.original_push));
        history.set_replace_mutator(Arc::clone(&self.original_replace));
        window.remove_event_listener(ListenerTarget::Window, self.load_listener);
        window.remove_event_listener(ListenerTarget::Window, self.popstate_listener);

        tracing::debug!("Navigation interceptor restored");
    }

    pub fn is_restored(&self) -> bool {
        self.restored.load(Ordering::SeqCst)
    }
}

impl Drop for NavigationInterceptor {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run `original`, then report where it left the location
fn wrap(original: HistoryMutator, on_navigate: NavigationCallback) -> HistoryMutator {
    Arc::new(move |state: &HistoryState, url: &str| {
        original(state, url);
        on_navigate(state.location());
    })
}
