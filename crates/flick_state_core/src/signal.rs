//! Existence-only marker files.

use crate::channel::{ChannelError, ChannelResult};
use crate::config::StateConfig;
use crate::store::atomic::remove_if_present;
use log::{debug, info};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const UNLOCK_SIGNAL_NAME: &str = "unlock_signal";
pub const HAPTIC_SIGNAL_NAME: &str = "flick_haptic";

/// Boolean event shared across processes by the mere existence of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFile {
    path: PathBuf,
}

impl SignalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<state_dir>/unlock_signal`, raised by the lock screen on success.
    pub fn unlock(config: &StateConfig) -> Self {
        Self::new(config.state_dir.join(UNLOCK_SIGNAL_NAME))
    }

    /// `<command_dir>/flick_haptic`, raised to request one haptic pulse.
    pub fn haptic(config: &StateConfig) -> Self {
        Self::new(config.command_dir.join(HAPTIC_SIGNAL_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the marker (and its parent directory). Idempotent; an
    /// existing marker keeps its content and mtime.
    pub fn raise(&self) -> ChannelResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        info!("event=signal_raise module=signal status=ok signal={}", self.name());
        Ok(())
    }

    pub fn check(&self) -> bool {
        self.path.exists()
    }

    /// Deletes the marker; clearing an absent signal is not an error.
    pub fn clear(&self) -> ChannelResult<()> {
        let removed = remove_if_present(&self.path).map_err(|source| self.io_error(source))?;
        debug!(
            "event=signal_clear module=signal status=ok signal={} removed={}",
            self.name(),
            removed
        );
        Ok(())
    }

    /// Consumes the signal: returns whether it was raised and clears it.
    pub fn take(&self) -> ChannelResult<bool> {
        let removed = remove_if_present(&self.path).map_err(|source| self.io_error(source))?;
        if removed {
            info!("event=signal_take module=signal status=ok signal={}", self.name());
        }
        Ok(removed)
    }

    /// mtime of the marker, when raised.
    pub fn raised_at(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
    }

    fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("signal")
    }

    fn io_error(&self, source: std::io::Error) -> ChannelError {
        ChannelError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
