//! Single-writer store service.
//!
//! # Responsibility
//! - Own one [`StateStore`] on a dedicated thread and apply requests from an
//!   in-process queue one at a time.
//! - Publish a [`DocumentChange`] to subscribers after every successful
//!   write or removal.
//!
//! # Invariants
//! - Requests from all handles are applied in queue order; read-modify-write
//!   through [`StoreHandle::update_value`] cannot interleave with another
//!   in-process write.
//! - Subscribers see changes in the order they were applied.
//! - Once stopped, every handle call returns `StoreError::ServiceStopped`.

use super::{DocumentKey, StateStore, StoreError, StoreResult};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::thread::JoinHandle;
use std::time::Duration;

type UpdateFn = Box<dyn FnOnce(Option<Value>) -> Value + Send>;

enum Request {
    Read {
        key: DocumentKey,
        reply: Sender<Option<Value>>,
    },
    Write {
        key: DocumentKey,
        value: Value,
        reply: Sender<StoreResult<()>>,
    },
    Update {
        key: DocumentKey,
        apply: UpdateFn,
        reply: Sender<StoreResult<Value>>,
    },
    Remove {
        key: DocumentKey,
        reply: Sender<StoreResult<bool>>,
    },
    Subscribe {
        key: DocumentKey,
        sink: Sender<DocumentChange>,
    },
    Shutdown,
}

/// Notification published after a document was written or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub key: DocumentKey,
    /// New content; `None` when the document was removed.
    pub value: Option<Value>,
}

/// Receiving end of one key's change feed.
pub struct Subscription {
    key: DocumentKey,
    changes: Receiver<DocumentChange>,
}

impl Subscription {
    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Next change if one is already queued.
    pub fn try_next(&self) -> Option<DocumentChange> {
        self.changes.try_recv().ok()
    }

    /// Waits up to `timeout`; `None` on timeout or when the service stopped.
    pub fn next_timeout(&self, timeout: Duration) -> Option<DocumentChange> {
        match self.changes.recv_timeout(timeout) {
            Ok(change) => Some(change),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains every queued change, oldest first.
    pub fn drain(&self) -> Vec<DocumentChange> {
        self.changes.try_iter().collect()
    }
}

/// Cloneable client of a running [`StoreService`].
#[derive(Clone)]
pub struct StoreHandle {
    requests: Sender<Request>,
}

impl StoreHandle {
    pub fn read_value(&self, key: &DocumentKey) -> StoreResult<Option<Value>> {
        let (reply, response) = bounded(1);
        self.submit(Request::Read {
            key: key.clone(),
            reply,
        })?;
        response.recv().map_err(|_| StoreError::ServiceStopped)
    }

    pub fn write_value(&self, key: &DocumentKey, value: Value) -> StoreResult<()> {
        let (reply, response) = bounded(1);
        self.submit(Request::Write {
            key: key.clone(),
            value,
            reply,
        })?;
        response.recv().map_err(|_| StoreError::ServiceStopped)?
    }

    /// Applies `apply` to the current content (or `None`) and writes the
    /// result, serialized against every other request of this service.
    pub fn update_value<F>(&self, key: &DocumentKey, apply: F) -> StoreResult<Value>
    where
        F: FnOnce(Option<Value>) -> Value + Send + 'static,
    {
        let (reply, response) = bounded(1);
        self.submit(Request::Update {
            key: key.clone(),
            apply: Box::new(apply),
            reply,
        })?;
        response.recv().map_err(|_| StoreError::ServiceStopped)?
    }

    pub fn remove(&self, key: &DocumentKey) -> StoreResult<bool> {
        let (reply, response) = bounded(1);
        self.submit(Request::Remove {
            key: key.clone(),
            reply,
        })?;
        response.recv().map_err(|_| StoreError::ServiceStopped)?
    }

    /// Subscribes to changes applied through this service after the call.
    pub fn subscribe(&self, key: &DocumentKey) -> StoreResult<Subscription> {
        let (sink, changes) = unbounded();
        self.submit(Request::Subscribe {
            key: key.clone(),
            sink,
        })?;
        Ok(Subscription {
            key: key.clone(),
            changes,
        })
    }

    fn submit(&self, request: Request) -> StoreResult<()> {
        self.requests
            .send(request)
            .map_err(|_| StoreError::ServiceStopped)
    }
}

/// Owner of the store thread. Dropping it stops the service.
pub struct StoreService {
    handle: StoreHandle,
    worker: Option<JoinHandle<()>>,
}

impl StoreService {
    /// Starts the service thread.
    ///
    /// # Errors
    /// - `StoreError::Io` when the thread cannot be spawned.
    pub fn spawn(store: StateStore) -> StoreResult<Self> {
        let (requests, queue) = unbounded();
        let root = store.root().to_path_buf();
        let worker = std::thread::Builder::new()
            .name("flick-store".to_string())
            .spawn(move || run(store, queue))
            .map_err(|source| StoreError::Io { path: root, source })?;

        Ok(Self {
            handle: StoreHandle { requests },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    /// Stops accepting requests after those already queued, then joins.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.requests.send(Request::Shutdown);
            if worker.join().is_err() {
                warn!("event=store_service_stop module=store status=error reason=worker_panicked");
            }
        }
    }
}

impl Drop for StoreService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(store: StateStore, queue: Receiver<Request>) {
    info!(
        "event=store_service_start module=store status=ok root={}",
        store.root().display()
    );
    let mut subscribers: HashMap<DocumentKey, Vec<Sender<DocumentChange>>> = HashMap::new();

    for request in queue.iter() {
        match request {
            Request::Read { key, reply } => {
                let _ = reply.send(store.read_value(&key));
            }
            Request::Write { key, value, reply } => {
                let result = store.write(&key, &value);
                if result.is_ok() {
                    publish(&mut subscribers, &key, Some(value));
                }
                let _ = reply.send(result);
            }
            Request::Update { key, apply, reply } => {
                let value = apply(store.read_value(&key));
                let result = store.write(&key, &value);
                let result = match result {
                    Ok(()) => {
                        publish(&mut subscribers, &key, Some(value.clone()));
                        Ok(value)
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            Request::Remove { key, reply } => {
                let result = store.remove(&key);
                if matches!(result, Ok(true)) {
                    publish(&mut subscribers, &key, None);
                }
                let _ = reply.send(result);
            }
            Request::Subscribe { key, sink } => {
                debug!("event=store_subscribe module=store status=ok key={key}");
                subscribers.entry(key).or_default().push(sink);
            }
            Request::Shutdown => break,
        }
    }

    info!("event=store_service_stop module=store status=ok");
}

fn publish(
    subscribers: &mut HashMap<DocumentKey, Vec<Sender<DocumentChange>>>,
    key: &DocumentKey,
    value: Option<Value>,
) {
    let Some(sinks) = subscribers.get_mut(key) else {
        return;
    };
    let change = DocumentChange {
        key: key.clone(),
        value,
    };
    sinks.retain(|sink| sink.send(change.clone()).is_ok());
    if sinks.is_empty() {
        subscribers.remove(key);
    }
}
