//! Phone call documents.
//!
//! - `call_history.json`: recent calls, newest first.
//! - `<command_dir>/flick_phone_status`: the live call, published by the
//!   phone daemon and polled by the UI.

use super::messages::iso_timestamp_now;
use crate::config::StateConfig;
use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const CALL_HISTORY_KEY: &str = "call_history.json";
pub const CALL_STATUS_FILE: &str = "flick_phone_status";
pub const MAX_CALL_HISTORY: usize = 100;

/// Modem call state as reported by the telephony stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    #[default]
    Idle,
    Incoming,
    Dialing,
    Alerting,
    Active,
    Held,
    Waiting,
    Disconnected,
    #[serde(other)]
    Unknown,
}

impl CallState {
    /// States whose return to `idle` ends a call.
    pub fn is_call(self) -> bool {
        matches!(
            self,
            Self::Incoming | Self::Dialing | Self::Alerting | Self::Active | Self::Held
        )
    }

    /// Outgoing call that has not been answered yet.
    pub fn is_outgoing_setup(self) -> bool {
        matches!(self, Self::Dialing | Self::Alerting)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStatus {
    #[serde(default)]
    pub state: CallState,
    #[serde(default)]
    pub number: String,
    /// Modem object path of the call, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Seconds since the call was dialed or answered.
    #[serde(default)]
    pub duration: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallStatus {
    /// `<command_dir>/flick_phone_status`.
    pub fn path(config: &StateConfig) -> PathBuf {
        config.command_dir.join(CALL_STATUS_FILE)
    }

    pub(crate) fn volatile_key() -> DocumentKey {
        DocumentKey::well_known(CALL_STATUS_FILE)
    }

    pub fn is_idle(&self) -> bool {
        self.state == CallState::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Incoming,
    Outgoing,
    Missed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub number: String,
    pub direction: CallDirection,
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallRecord {
    /// Record stamped with the current local time.
    pub fn new(number: impl Into<String>, direction: CallDirection, duration: u64) -> Self {
        Self {
            number: number.into(),
            direction,
            duration,
            timestamp: iso_timestamp_now(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallHistory {
    records: Vec<CallRecord>,
}

impl CallHistory {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(CALL_HISTORY_KEY)
    }

    /// Prepends `record` and drops the oldest beyond the cap.
    pub fn record(&mut self, record: CallRecord) {
        self.records.insert(0, record);
        self.records.truncate(MAX_CALL_HISTORY);
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn missed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.direction == CallDirection::Missed)
            .count()
    }
}
