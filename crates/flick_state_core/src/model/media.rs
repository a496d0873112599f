//! `media_status.json`: now-playing state published by the media bridge.

use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const MEDIA_STATUS_KEY: &str = "media_status.json";
pub const MEDIA_COMMAND_SLOT: &str = "media_command";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaStatus {
    #[serde(default)]
    pub playing: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Player that owns the session.
    #[serde(default)]
    pub app: String,
    /// Seconds.
    #[serde(default)]
    pub position: f64,
    /// Seconds; `0` when unknown.
    #[serde(default)]
    pub duration: f64,
    /// Unix epoch milliseconds of the last publish.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaStatus {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(MEDIA_STATUS_KEY)
    }

    /// Whether the publisher has gone quiet for longer than `max_age`.
    pub fn is_stale(&self, now_ms: i64, max_age: Duration) -> bool {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) > max_age_ms
    }

    /// Playback progress in `0.0..=1.0`; `0.0` without a known duration.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.position / self.duration).clamp(0.0, 1.0)
    }

    /// Nothing is loaded in any player.
    pub fn is_idle(&self) -> bool {
        !self.playing && self.title.is_empty()
    }
}
