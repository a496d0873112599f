//! Media control over `media_status.json` and the `media_command` slot.

use super::ServiceResult;
use crate::channel::{now_epoch_ms, CommandMailbox, MediaCommand};
use crate::config::StateConfig;
use crate::model::media::{MediaStatus, MEDIA_COMMAND_SLOT};
use crate::store::StateStore;
use log::{debug, warn};

pub struct MediaRemote {
    store: StateStore,
    slot: CommandMailbox,
}

impl MediaRemote {
    pub fn new(config: &StateConfig) -> ServiceResult<Self> {
        Ok(Self {
            store: StateStore::from_config(config),
            slot: CommandMailbox::in_state_dir(config, MEDIA_COMMAND_SLOT)?,
        })
    }

    /// UI side: latest published status.
    pub fn status(&self) -> MediaStatus {
        self.store.read_or_default(&MediaStatus::key())
    }

    /// UI side: replaces any unconsumed command with `command`.
    pub fn send(&self, command: MediaCommand) -> ServiceResult<()> {
        self.slot.send_line(&command.encode_line(now_epoch_ms()))?;
        debug!("event=media_send module=service status=ok command={command}");
        Ok(())
    }

    /// Bridge side: takes the pending command. Unknown lines are dropped.
    pub fn receive(&self) -> ServiceResult<Option<MediaCommand>> {
        let Some(line) = self.slot.receive_line()? else {
            return Ok(None);
        };
        let command = MediaCommand::parse_line(&line);
        if command.is_none() {
            warn!("event=media_receive module=service status=skip reason=unknown_command");
        }
        Ok(command)
    }

    /// Bridge side: publishes the now-playing state.
    pub fn publish_status(&self, status: &MediaStatus) -> ServiceResult<()> {
        self.store.write(&MediaStatus::key(), status)?;
        Ok(())
    }
}
