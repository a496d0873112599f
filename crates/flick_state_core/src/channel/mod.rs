//! One-shot command handoff from UI processes to daemons.
//!
//! # Responsibility
//! - Define the `{action, data, timestamp}` command record.
//! - Provide the single-slot mailbox compatible with the existing daemons.
//! - Provide a lossless spool for consumers that can read a directory.
//!
//! # Invariants
//! - A received command is returned at most once.
//! - Slots and spool entries are written atomically.
//! - The single-slot mailbox keeps only the latest unconsumed command.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod command;
mod mailbox;
mod media;
mod queue;

pub use command::{now_epoch_ms, Command};
pub use mailbox::CommandMailbox;
pub use media::MediaCommand;
pub use queue::CommandQueue;

pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Debug)]
pub enum ChannelError {
    /// Slot or app name that cannot be used as a file name.
    InvalidSlot(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSlot(name) => write!(f, "invalid command slot name `{name}`"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Serialize(err) => write!(f, "cannot serialize command: {err}"),
        }
    }
}

impl Error for ChannelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSlot(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Transport contract shared by the mailbox and the spool.
pub trait CommandChannel {
    fn send(&self, command: &Command) -> ChannelResult<()>;
    /// Takes the next command, if any. Malformed entries are discarded.
    fn receive(&self) -> ChannelResult<Option<Command>>;
    /// Whether an unconsumed command is waiting.
    fn pending(&self) -> bool;
}
