//! Shell-side lock screen session.
//!
//! # Responsibility
//! - Decide when the lock screen is active from `lock_config.json`.
//! - Observe the `unlock_signal` marker raised when the lock-screen app
//!   accepts a credential.
//!
//! # Invariants
//! - A marker left over from a previous session never unlocks a new one:
//!   it is cleared at startup and on every `lock()`.
//! - The marker is only consumed while the session is active.

use super::ServiceResult;
use crate::config::StateConfig;
use crate::model::lock::LockConfig;
use crate::signal::SignalFile;
use crate::store::StateStore;
use log::info;
use std::time::{Duration, Instant};

/// Window after an unlock during which view changes from the exiting
/// lock-screen app are ignored.
pub const RECENT_UNLOCK_WINDOW: Duration = Duration::from_secs(2);

pub struct LockSession {
    store: StateStore,
    signal: SignalFile,
    config: LockConfig,
    active: bool,
    last_unlock: Option<Instant>,
}

impl LockSession {
    /// Loads the lock config and clears a stale unlock marker.
    ///
    /// The session starts active when a lock method is configured.
    pub fn start(config: &StateConfig) -> ServiceResult<Self> {
        let store = StateStore::from_config(config);
        let signal = SignalFile::unlock(config);
        if signal.check() {
            info!("event=lock_start module=service status=ok reason=stale_signal_cleared");
        }
        signal.clear()?;
        let lock_config: LockConfig = store.read_or_default(&LockConfig::key());
        let active = lock_config.requires_unlock();
        Ok(Self {
            store,
            signal,
            config: lock_config,
            active,
            last_unlock: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn signal(&self) -> &SignalFile {
        &self.signal
    }

    /// Reloads the config and activates when a method is set. Returns
    /// whether the session is now active.
    pub fn lock(&mut self) -> ServiceResult<bool> {
        self.config = self.store.read_or_default(&LockConfig::key());
        if self.config.requires_unlock() {
            self.active = true;
            self.signal.clear()?;
            info!("event=lock module=service status=ok");
        }
        Ok(self.active)
    }

    /// Consumes the unlock marker while active; `true` means the session
    /// just unlocked.
    pub fn poll_unlock(&mut self) -> ServiceResult<bool> {
        if !self.active {
            return Ok(false);
        }
        if !self.signal.take()? {
            return Ok(false);
        }
        self.mark_unlocked();
        Ok(true)
    }

    /// Unlocks directly (credential verified in-process).
    pub fn unlock(&mut self) -> ServiceResult<()> {
        self.signal.clear()?;
        self.mark_unlocked();
        Ok(())
    }

    pub fn recently_unlocked(&self) -> bool {
        self.last_unlock
            .map(|at| at.elapsed() < RECENT_UNLOCK_WINDOW)
            .unwrap_or(false)
    }

    /// Lock-screen process side: exit code `0` means the credential was
    /// accepted and raises the marker. Returns whether it was raised.
    pub fn finish_lockscreen(&self, exit_code: i32) -> ServiceResult<bool> {
        if exit_code != 0 {
            info!("event=lockscreen_exit module=service status=skip exit_code={exit_code}");
            return Ok(false);
        }
        self.signal.raise()?;
        Ok(true)
    }

    fn mark_unlocked(&mut self) {
        self.active = false;
        self.last_unlock = Some(Instant::now());
        info!("event=unlock module=service status=ok");
    }
}
