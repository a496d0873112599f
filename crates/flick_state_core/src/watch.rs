//! File-notification change feed for the state directory.
//!
//! # Responsibility
//! - Turn filesystem events under the state directory into debounced sets
//!   of changed document keys.
//!
//! # Invariants
//! - Temp files from atomic writes and claimed command slots never surface
//!   as keys (they are not valid [`DocumentKey`]s).
//! - A burst of events is reported once, after `debounce` of quiet.

use crate::store::DocumentKey;
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use log::{debug, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub type WatchResult<T> = Result<T, WatchError>;

#[derive(Debug)]
pub enum WatchError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Notify(notify::Error),
}

impl Display for WatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Notify(err) => write!(f, "file watcher failed: {err}"),
        }
    }
}

impl Error for WatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Notify(err) => Some(err),
        }
    }
}

impl From<notify::Error> for WatchError {
    fn from(value: notify::Error) -> Self {
        Self::Notify(value)
    }
}

/// Debounced watcher over the top level of a state directory.
pub struct StateDirWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    root: PathBuf,
    debounce: Duration,
    last_event_at: Option<Instant>,
    pending: BTreeSet<DocumentKey>,
}

impl StateDirWatcher {
    /// Starts watching `root` (created when missing).
    pub fn new(root: impl Into<PathBuf>, debounce: Duration) -> WatchResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| WatchError::Io {
            path: root.clone(),
            source,
        })?;
        // Events carry canonical paths on some platforms.
        let root = root.canonicalize().map_err(|source| WatchError::Io {
            path: root.clone(),
            source,
        })?;

        let (sender, events) = unbounded::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(
            move |event: notify::Result<Event>| {
                let _ = sender.send(event);
            },
            notify::Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        debug!(
            "event=watch_start module=watch status=ok root={} debounce_ms={}",
            root.display(),
            debounce.as_millis()
        );

        Ok(Self {
            _watcher: watcher,
            events,
            root,
            debounce,
            last_event_at: None,
            pending: BTreeSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drains queued events; returns the changed keys once the debounce
    /// window has passed without new events.
    pub fn check_for_changes(&mut self) -> Option<Vec<DocumentKey>> {
        let mut saw_event = false;
        loop {
            match self.events.try_recv() {
                Ok(Ok(event)) if is_content_event(&event) => {
                    for path in &event.paths {
                        if let Some(key) = DocumentKey::from_path(&self.root, path) {
                            self.pending.insert(key);
                            saw_event = true;
                        }
                    }
                }
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    warn!("event=watch_event module=watch status=error error={err}");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if saw_event {
            self.last_event_at = Some(Instant::now());
        }

        match self.last_event_at {
            Some(last) if !self.pending.is_empty() && last.elapsed() >= self.debounce => {
                self.last_event_at = None;
                Some(std::mem::take(&mut self.pending).into_iter().collect())
            }
            _ => None,
        }
    }

    /// Blocks up to `timeout` for a debounced batch of changes.
    pub fn wait_for_changes(&mut self, timeout: Duration) -> Option<Vec<DocumentKey>> {
        let deadline = Instant::now() + timeout;
        let step = (self.debounce / 2).max(Duration::from_millis(10));
        loop {
            if let Some(changes) = self.check_for_changes() {
                return Some(changes);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            std::thread::sleep(step.min(deadline - now));
        }
    }
}

fn is_content_event(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
