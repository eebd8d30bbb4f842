//! Session history with replaceable mutators
//!
//! `push_state` and `replace_state` dispatch through mutator slots rather than
//! fixed methods, the same way page scripts can reassign
//! `history.pushState`. Whoever swaps a mutator is responsible for putting the
//! previous one back.

use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

/// Signature of the push/replace entry points
pub type HistoryMutator = Arc<dyn Fn(&HistoryState, &str) + Send + Sync>;

/// Location and entry stack shared by the window and its history
pub struct HistoryState {
    location: RwLock<String>,
    entries: RwLock<Vec<String>>,
    index: RwLock<usize>,
}

impl HistoryState {
    fn new(url: &str) -> Self {
        Self {
            location: RwLock::new(url.to_string()),
            entries: RwLock::new(vec![url.to_string()]),
            index: RwLock::new(0),
        }
    }

    pub fn location(&self) -> String {
        self.location.read().clone()
    }

    /// Drop forward entries, append `url` and make it current
    pub fn push_entry(&self, url: &str) {
        let url = resolve_url(&self.location(), url);
        let mut entries = self.entries.write();
        let mut index = self.index.write();
        entries.truncate(*index + 1);
        entries.push(url.clone());
        *index = entries.len() - 1;
        *self.location.write() = url;
    }

    /// Overwrite the current entry with `url`
    pub fn replace_entry(&self, url: &str) {
        let url = resolve_url(&self.location(), url);
        let mut entries = self.entries.write();
        let index = *self.index.read();
        if let Some(entry) = entries.get_mut(index) {
            *entry = url.clone();
        }
        *self.location.write() = url;
    }

    /// Move `delta` entries; returns the new location, or `None` if out of range
    pub fn go(&self, delta: isize) -> Option<String> {
        let entries = self.entries.read();
        let mut index = self.index.write();
        let target = (*index as isize).checked_add(delta)?;
        if target < 0 || target as usize >= entries.len() {
            return None;
        }
        *index = target as usize;
        let url = entries[*index].clone();
        *self.location.write() = url.clone();
        Some(url)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn native_push() -> HistoryMutator {
    Arc::new(|state: &HistoryState, url: &str| state.push_entry(url))
}

fn native_replace() -> HistoryMutator {
    Arc::new(|state: &HistoryState, url: &str| state.replace_entry(url))
}

pub struct History {
    state: HistoryState,
    push: RwLock<HistoryMutator>,
    replace: RwLock<HistoryMutator>,
}

impl History {
    pub fn new(url: &str) -> Self {
        Self {
            state: HistoryState::new(url),
            push: RwLock::new(native_push()),
            replace: RwLock::new(native_replace()),
        }
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    pub fn push_state(&self, url: &str) {
        // Clone out of the slot so a mutator may itself swap mutators.
        let mutator = Arc::clone(&self.push.read());
        mutator(&self.state, url);
    }

    pub fn replace_state(&self, url: &str) {
        let mutator = Arc::clone(&self.replace.read());
        mutator(&self.state, url);
    }

    pub fn push_mutator(&self) -> HistoryMutator {
        Arc::clone(&self.push.read())
    }

    pub fn replace_mutator(&self) -> HistoryMutator {
        Arc::clone(&self.replace.read())
    }

    /// Install a new push mutator, returning the one it replaced
    pub fn set_push_mutator(&self, mutator: HistoryMutator) -> HistoryMutator {
        std::mem::replace(&mut *self.push.write(), mutator)
    }

    pub fn set_replace_mutator(&self, mutator: HistoryMutator) -> HistoryMutator {
        std::mem::replace(&mut *self.replace.write(), mutator)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// Resolve `url` against `base` the way `location` does. Anything that
/// cannot be resolved is kept as given.
pub fn resolve_url(base: &str, url: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(url))
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}
