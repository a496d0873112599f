//! JSON document store over the shared state directory.
//!
//! # Responsibility
//! - Address documents by validated relative keys.
//! - Read leniently (missing or corrupt documents become caller defaults).
//! - Write whole documents atomically (temp file plus rename).
//! - Serialize in-process access through a single-writer service.
//!
//! # Invariants
//! - A reader never observes a half-written document written by this crate.
//! - Writes always replace the full document; there are no partial patches.
//! - Nothing here locks across processes: the last writer wins.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub(crate) mod atomic;
mod document;
mod key;
pub mod service;

pub use document::StateStore;
pub use key::DocumentKey;
pub use service::{DocumentChange, StoreHandle, StoreService, Subscription};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    InvalidKey(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Serialize(serde_json::Error),
    /// The store service thread is gone.
    ServiceStopped,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid document key `{key}`"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "{} is not valid JSON: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "cannot serialize document: {err}"),
            Self::ServiceStopped => write!(f, "store service is not running"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::InvalidKey(_) | Self::ServiceStopped => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}
