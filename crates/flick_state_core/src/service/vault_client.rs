//! UI side of the password-vault helper.
//!
//! # Responsibility
//! - Read the helper's last response from `<command_dir>/flick_vault_status`.
//! - Poll that file and turn new responses into [`VaultEvent`]s.
//! - Keep the known-vault registry in the state dir.
//!
//! # Invariants
//! - The status file is only read from the command dir; the state dir
//!   holds the registry alone.
//! - An unchanged response is delivered at most once per watch.

use super::{ServiceError, ServiceResult};
use crate::config::StateConfig;
use crate::model::vault::{VaultRegistry, VaultStatus};
use crate::poll::{watch_document, PollControl, PollHandle, StartMode};
use crate::store::StateStore;
use crate::view::VaultEvent;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct VaultClient {
    status_store: StateStore,
    store: StateStore,
    status_path: PathBuf,
    poll_interval: Duration,
}

impl VaultClient {
    pub fn new(config: &StateConfig) -> Self {
        Self {
            status_store: StateStore::volatile(config),
            store: StateStore::from_config(config),
            status_path: VaultStatus::path(config),
            poll_interval: config.poll.vault_status,
        }
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    /// Latest helper response; `None` before the helper has written one.
    pub fn status(&self) -> Option<VaultStatus> {
        self.status_store.read(&VaultStatus::volatile_key(), None)
    }

    pub fn registry(&self) -> VaultRegistry {
        VaultRegistry::load(&self.store)
    }

    /// Records `path` as known and last opened.
    pub fn remember(&self, path: &str) -> ServiceResult<VaultRegistry> {
        let mut registry = self.registry();
        registry.remember(path);
        registry.save(&self.store)?;
        Ok(registry)
    }

    /// Polls the status file and calls `on_event` for each new response
    /// that maps to navigation.
    ///
    /// A response already present when the watch starts is delivered on
    /// the first tick.
    pub fn watch_events<F>(&self, mut on_event: F) -> ServiceResult<PollHandle>
    where
        F: FnMut(VaultEvent) -> PollControl + Send + 'static,
    {
        watch_document(
            self.status_store.clone(),
            VaultStatus::volatile_key(),
            None::<VaultStatus>,
            self.poll_interval,
            StartMode::Immediate,
            move |status: Option<VaultStatus>| {
                let Some(status) = status else {
                    return PollControl::Continue;
                };
                match VaultEvent::from_status(&status) {
                    Some(event) => {
                        debug!(
                            "event=vault_status module=service status=ok action={}",
                            status.action
                        );
                        on_event(event)
                    }
                    None => PollControl::Continue,
                }
            },
        )
        .map_err(ServiceError::Spawn)
    }
}
