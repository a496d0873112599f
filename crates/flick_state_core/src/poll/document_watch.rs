use super::{PollControl, PollHandle, PollLoop, StartMode};
use crate::store::{DocumentKey, StateStore};
use serde::de::DeserializeOwned;
use std::io;
use std::time::Duration;

/// Last-seen cache for one document, reporting only content changes.
pub struct DocumentWatch<T> {
    store: StateStore,
    key: DocumentKey,
    default: T,
    last_seen: Option<T>,
}

impl<T> DocumentWatch<T>
where
    T: DeserializeOwned + PartialEq + Clone,
{
    /// `default` stands in for a missing or unreadable document.
    pub fn new(store: StateStore, key: DocumentKey, default: T) -> Self {
        Self {
            store,
            key,
            default,
            last_seen: None,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Re-reads the document; `Some` on the first call and whenever the
    /// content differs from the previous poll.
    pub fn poll(&mut self) -> Option<T> {
        let current = self.store.read(&self.key, self.default.clone());
        if self.last_seen.as_ref() == Some(&current) {
            return None;
        }
        self.last_seen = Some(current.clone());
        Some(current)
    }

    pub fn last_seen(&self) -> Option<&T> {
        self.last_seen.as_ref()
    }
}

/// Polls `key` every `interval` and calls `on_change` with each new value.
///
/// The initial value is delivered on the first tick.
pub fn watch_document<T, F>(
    store: StateStore,
    key: DocumentKey,
    default: T,
    interval: Duration,
    start: StartMode,
    mut on_change: F,
) -> io::Result<PollHandle>
where
    T: DeserializeOwned + PartialEq + Clone + Send + 'static,
    F: FnMut(T) -> PollControl + Send + 'static,
{
    let name = key.to_string();
    let mut watch = DocumentWatch::new(store, key, default);
    PollLoop::schedule(&name, interval, start, move || match watch.poll() {
        Some(value) => on_change(value),
        None => PollControl::Continue,
    })
}
