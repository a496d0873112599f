//! `lock_config.json`: lock screen method and policy.

use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LOCK_CONFIG_KEY: &str = "lock_config.json";
pub const DEFAULT_LOCK_TIMEOUT_SECS: i32 = 300;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMethod {
    #[default]
    None,
    Pin,
    Pattern,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default)]
    pub method: LockMethod,
    /// Opaque; verified by the lock screen helper, never here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_hash: Option<String>,
    /// Auto-lock after this many seconds; `0` immediate, `-1` never.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_timeout() -> i32 {
    DEFAULT_LOCK_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            method: LockMethod::None,
            pin_hash: None,
            pattern_hash: None,
            timeout_seconds: default_timeout(),
            max_attempts: default_max_attempts(),
            extra: Map::new(),
        }
    }
}

impl LockConfig {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(LOCK_CONFIG_KEY)
    }

    pub fn requires_unlock(&self) -> bool {
        self.method != LockMethod::None
    }

    pub fn auto_lock_enabled(&self) -> bool {
        self.timeout_seconds >= 0
    }
}
