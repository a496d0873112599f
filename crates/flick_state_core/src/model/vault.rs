//! Password-vault helper documents.
//!
//! - `passwordsafe/vaults.json`: known vault paths.
//! - `passwordsafe/last_vault.json`: vault to auto-open.
//! - `<command_dir>/flick_vault_status`: last helper response, polled by
//!   the UI.

use crate::config::StateConfig;
use crate::store::{DocumentKey, StateStore, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const KNOWN_VAULTS_KEY: &str = "passwordsafe/vaults.json";
pub const LAST_VAULT_KEY: &str = "passwordsafe/last_vault.json";
pub const VAULT_STATUS_FILE: &str = "flick_vault_status";

/// Known vault paths in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownVaults {
    paths: Vec<String>,
}

impl KnownVaults {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(KNOWN_VAULTS_KEY)
    }

    /// Returns `false` when the path was already known.
    pub fn add(&mut self, path: &str) -> bool {
        if self.contains(path) {
            return false;
        }
        self.paths.push(path.to_string());
        true
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.paths.len();
        self.paths.retain(|known| known != path);
        self.paths.len() != before
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|known| known == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastVault {
    #[serde(default)]
    pub path: Option<String>,
}

impl LastVault {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(LAST_VAULT_KEY)
    }
}

/// Known vaults plus the last-opened one, loaded and saved together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultRegistry {
    pub known: KnownVaults,
    pub last: LastVault,
}

impl VaultRegistry {
    pub fn load(store: &StateStore) -> Self {
        Self {
            known: store.read_or_default(&KnownVaults::key()),
            last: store.read_or_default(&LastVault::key()),
        }
    }

    pub fn save(&self, store: &StateStore) -> StoreResult<()> {
        store.write(&KnownVaults::key(), &self.known)?;
        store.write(&LastVault::key(), &self.last)
    }

    /// Records `path` as known and as the vault to reopen.
    pub fn remember(&mut self, path: &str) {
        self.known.add(path);
        self.last.path = Some(path.to_string());
    }

    /// Drops `path`; the last-opened pointer is cleared when it named it.
    pub fn forget(&mut self, path: &str) -> bool {
        if self.last.path.as_deref() == Some(path) {
            self.last.path = None;
        }
        self.known.remove(path)
    }

    /// Last-opened vault, when it is still known.
    pub fn last_opened(&self) -> Option<&str> {
        self.last
            .path
            .as_deref()
            .filter(|path| self.known.contains(path))
    }
}

/// Entry row as listed by the helper (no secrets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntrySummary {
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub group: String,
}

/// Helper response for the most recent request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultStatus {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub unlocked: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<VaultEntrySummary>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VaultStatus {
    /// `<command_dir>/flick_vault_status`; never under the state dir.
    pub fn path(config: &StateConfig) -> PathBuf {
        config.command_dir.join(VAULT_STATUS_FILE)
    }

    /// Key within [`StateStore::volatile`].
    pub(crate) fn volatile_key() -> DocumentKey {
        DocumentKey::well_known(VAULT_STATUS_FILE)
    }
}
