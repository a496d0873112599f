//! Lenient-read, atomic-write document store.

use super::atomic::{read_if_present, remove_if_present, write_atomic};
use super::{DocumentKey, StoreError, StoreResult};
use crate::config::{JsonStyle, StateConfig};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

/// Directory of independently read/written JSON documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    root: PathBuf,
    json_style: JsonStyle,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>, json_style: JsonStyle) -> Self {
        Self {
            root: root.into(),
            json_style,
        }
    }

    pub fn from_config(config: &StateConfig) -> Self {
        Self::new(config.state_dir.clone(), config.json_style)
    }

    /// Store over the command dir, where helper daemons publish their
    /// per-boot status files.
    pub fn volatile(config: &StateConfig) -> Self {
        Self::new(config.command_dir.clone(), config.json_style)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn json_style(&self) -> JsonStyle {
        self.json_style
    }

    pub fn path_of(&self, key: &DocumentKey) -> PathBuf {
        key.resolve(&self.root)
    }

    /// Reads a document, falling back to `default` on any failure.
    ///
    /// Missing, empty, unreadable and unparsable documents all map to
    /// `default`; the failure is logged and never surfaced.
    pub fn read<T: DeserializeOwned>(&self, key: &DocumentKey, default: T) -> T {
        match self.try_read(key) {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!("event=store_read module=store status=skip reason=missing key={key}");
                default
            }
            Err(err) => {
                warn!("event=store_read module=store status=error key={key} error={err}");
                default
            }
        }
    }

    /// [`StateStore::read`] with `T::default()` as the fallback.
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: &DocumentKey) -> T {
        self.read(key, T::default())
    }

    /// Untyped read; `None` when the document is missing or unparsable.
    pub fn read_value(&self, key: &DocumentKey) -> Option<Value> {
        self.read(key, None)
    }

    /// Strict read that distinguishes absence from corruption.
    ///
    /// An empty or whitespace-only file counts as absent: it is what an
    /// interrupted non-atomic writer leaves behind.
    ///
    /// # Errors
    /// - `StoreError::Io` when the file exists but cannot be read.
    /// - `StoreError::Parse` when the content is not valid JSON for `T`.
    pub fn try_read<T: DeserializeOwned>(&self, key: &DocumentKey) -> StoreResult<Option<T>> {
        let path = self.path_of(key);
        let bytes = match read_if_present(&path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Parse { path, source })
    }

    /// Serializes the full document and atomically replaces the file.
    ///
    /// # Errors
    /// - `StoreError::Serialize` when `document` cannot be encoded.
    /// - `StoreError::Io` when the directory or file cannot be written.
    pub fn write<T: Serialize + ?Sized>(&self, key: &DocumentKey, document: &T) -> StoreResult<()> {
        let started_at = Instant::now();
        let bytes = encode_json(self.json_style, document)?;
        let path = self.path_of(key);

        match write_atomic(&path, &bytes) {
            Ok(()) => {
                debug!(
                    "event=store_write module=store status=ok key={} bytes={} duration_ms={}",
                    key,
                    bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(source) => {
                error!(
                    "event=store_write module=store status=error key={} duration_ms={} error={}",
                    key,
                    started_at.elapsed().as_millis(),
                    source
                );
                Err(StoreError::Io { path, source })
            }
        }
    }

    /// Read-modify-write of one document; returns the written value.
    ///
    /// Not atomic across processes: another writer between the read and the
    /// write is overwritten.
    pub fn update<T, F>(&self, key: &DocumentKey, default: T, mutate: F) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let mut document = self.read(key, default);
        mutate(&mut document);
        self.write(key, &document)?;
        Ok(document)
    }

    pub fn exists(&self, key: &DocumentKey) -> bool {
        self.path_of(key).is_file()
    }

    /// Filesystem mtime, used for informal staleness checks.
    pub fn last_modified(&self, key: &DocumentKey) -> Option<SystemTime> {
        std::fs::metadata(self.path_of(key))
            .and_then(|meta| meta.modified())
            .ok()
    }

    /// Deletes a document. Returns whether it existed.
    pub fn remove(&self, key: &DocumentKey) -> StoreResult<bool> {
        let path = self.path_of(key);
        remove_if_present(&path).map_err(|source| StoreError::Io { path, source })
    }
}

pub(crate) fn encode_json<T: Serialize + ?Sized>(
    style: JsonStyle,
    document: &T,
) -> StoreResult<Vec<u8>> {
    let mut bytes = match style {
        JsonStyle::Pretty => serde_json::to_vec_pretty(document)?,
        JsonStyle::Compact => serde_json::to_vec(document)?,
    };
    if style == JsonStyle::Pretty {
        bytes.push(b'\n');
    }
    Ok(bytes)
}
