//! Single-slot command file.

use super::{ChannelError, ChannelResult, Command, CommandChannel};
use crate::config::StateConfig;
use crate::store::atomic::{read_if_present, remove_if_present, write_atomic};
use crate::store::DocumentKey;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

static APP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid app name regex"));

/// One command file consumed-then-deleted by a daemon, e.g.
/// `/tmp/flick_messages_cmd` or `<state>/media_command`.
///
/// A `send` while a previous command is still unconsumed replaces it; the
/// earlier command is lost without an error on either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMailbox {
    path: PathBuf,
}

impl CommandMailbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<command_dir>/flick_<app>_cmd`.
    ///
    /// # Errors
    /// - `ChannelError::InvalidSlot` unless `app` matches `[a-z0-9_]+`.
    pub fn for_app(config: &StateConfig, app: &str) -> ChannelResult<Self> {
        if !APP_NAME_RE.is_match(app) {
            return Err(ChannelError::InvalidSlot(app.to_string()));
        }
        Ok(Self::new(config.command_dir.join(format!("flick_{app}_cmd"))))
    }

    /// A named slot inside the state directory (`media_command`,
    /// `verify_result`).
    pub fn in_state_dir(config: &StateConfig, name: &str) -> ChannelResult<Self> {
        let key = DocumentKey::new(name).map_err(|_| ChannelError::InvalidSlot(name.to_string()))?;
        Ok(Self::new(key.resolve(&config.state_dir)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a raw single-line command such as `seek:30:1734960000000`.
    pub fn send_line(&self, line: &str) -> ChannelResult<()> {
        self.put(line.trim_end().as_bytes())
    }

    /// Takes a raw single-line command; blank slots yield `None`.
    pub fn receive_line(&self) -> ChannelResult<Option<String>> {
        let Some(bytes) = self.take()? else {
            return Ok(None);
        };
        let line = String::from_utf8_lossy(&bytes).trim().to_string();
        Ok((!line.is_empty()).then_some(line))
    }

    fn put(&self, bytes: &[u8]) -> ChannelResult<()> {
        if self.path.exists() {
            // Documented lossy behavior: the unconsumed command is replaced.
            warn!(
                "event=command_send module=channel status=overwrite slot={}",
                self.slot_name()
            );
        }
        write_atomic(&self.path, bytes).map_err(|source| self.io_error(source))?;
        debug!(
            "event=command_send module=channel status=ok slot={} bytes={}",
            self.slot_name(),
            bytes.len()
        );
        Ok(())
    }

    /// Claims the slot by renaming it aside, then reads and deletes the claim.
    ///
    /// A `send` that lands after the rename creates a fresh slot and is kept
    /// for the next receive.
    fn take(&self) -> ChannelResult<Option<Vec<u8>>> {
        let claim = self.claim_path();
        match std::fs::rename(&self.path, &claim) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        }

        let bytes = read_if_present(&claim).map_err(|source| ChannelError::Io {
            path: claim.clone(),
            source,
        })?;
        remove_if_present(&claim).map_err(|source| ChannelError::Io {
            path: claim.clone(),
            source,
        })?;
        Ok(bytes)
    }

    /// Unique per receive, so concurrent receivers in one process never
    /// share a claim file.
    fn claim_path(&self) -> PathBuf {
        let name = format!(
            ".{}.claim-{}-{}",
            self.slot_name(),
            std::process::id(),
            Uuid::new_v4().simple()
        );
        self.path.with_file_name(name)
    }

    fn slot_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("slot")
    }

    fn io_error(&self, source: io::Error) -> ChannelError {
        ChannelError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CommandChannel for CommandMailbox {
    fn send(&self, command: &Command) -> ChannelResult<()> {
        let bytes = serde_json::to_vec(command)?;
        self.put(&bytes)
    }

    fn receive(&self) -> ChannelResult<Option<Command>> {
        let Some(bytes) = self.take()? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Command>(&bytes) {
            Ok(command) => {
                debug!(
                    "event=command_receive module=channel status=ok slot={} action={}",
                    self.slot_name(),
                    command.action
                );
                Ok(Some(command))
            }
            Err(err) => {
                warn!(
                    "event=command_receive module=channel status=error slot={} \
                     reason=malformed error={}",
                    self.slot_name(),
                    err
                );
                Ok(None)
            }
        }
    }

    fn pending(&self) -> bool {
        self.path.is_file()
    }
}
