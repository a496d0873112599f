//! Lossless command spool.

use super::{now_epoch_ms, ChannelError, ChannelResult, Command, CommandChannel};
use crate::store::atomic::{read_if_present, remove_if_present, write_atomic};
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const ENTRY_SUFFIX: &str = ".json";

/// Directory spool where every `send` becomes its own file.
///
/// Unlike [`super::CommandMailbox`], no command is overwritten: entries are
/// received oldest first by file name (`<enqueued_ms>-<seq>-<uuid>.json`).
/// Order follows enqueue time; the sender's `timestamp` field is payload
/// only.
#[derive(Debug)]
pub struct CommandQueue {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl CommandQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of unconsumed entries.
    pub fn len(&self) -> usize {
        self.entries().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry file names, oldest first. Dot-prefixed temp and claim files
    /// are skipped.
    fn entries(&self) -> io::Result<Vec<String>> {
        let listing = match std::fs::read_dir(&self.dir) {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut names = Vec::new();
        for entry in listing {
            let name = entry?.file_name();
            if let Some(name) = name.to_str() {
                if !name.starts_with('.') && name.ends_with(ENTRY_SUFFIX) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn next_entry_name(&self, enqueued_ms: i64) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "{:013}-{:06}-{}{}",
            enqueued_ms.max(0),
            sequence % 1_000_000,
            Uuid::new_v4().simple(),
            ENTRY_SUFFIX
        )
    }

    fn io_error(&self, source: io::Error) -> ChannelError {
        ChannelError::Io {
            path: self.dir.clone(),
            source,
        }
    }
}

impl CommandChannel for CommandQueue {
    fn send(&self, command: &Command) -> ChannelResult<()> {
        let bytes = serde_json::to_vec(command)?;
        let path = self.dir.join(self.next_entry_name(now_epoch_ms()));
        write_atomic(&path, &bytes).map_err(|source| ChannelError::Io { path, source })?;
        debug!(
            "event=command_enqueue module=channel status=ok action={}",
            command.action
        );
        Ok(())
    }

    fn receive(&self) -> ChannelResult<Option<Command>> {
        for name in self.entries().map_err(|source| self.io_error(source))? {
            let entry = self.dir.join(&name);
            let claim = self.dir.join(format!(".claimed-{name}"));
            match std::fs::rename(&entry, &claim) {
                Ok(()) => {}
                // Another consumer claimed it first.
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(ChannelError::Io { path: entry, source }),
            }

            let bytes = read_if_present(&claim).map_err(|source| ChannelError::Io {
                path: claim.clone(),
                source,
            })?;
            remove_if_present(&claim).map_err(|source| ChannelError::Io {
                path: claim.clone(),
                source,
            })?;

            let Some(bytes) = bytes else {
                continue;
            };
            match serde_json::from_slice::<Command>(&bytes) {
                Ok(command) => return Ok(Some(command)),
                Err(err) => warn!(
                    "event=command_dequeue module=channel status=error entry={} \
                     reason=malformed error={}",
                    name, err
                ),
            }
        }
        Ok(None)
    }

    fn pending(&self) -> bool {
        !self.is_empty()
    }
}
