//! `app_notifications.json`: notification requests for the shell.
//!
//! Helpers write a batch; the shell ingests it and deletes the document.

use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};

pub const APP_NOTIFICATIONS_KEY: &str = "app_notifications.json";
pub const MAX_BODY_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNotification {
    pub app_name: String,
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub urgency: Urgency,
}

impl AppNotification {
    /// Normal-urgency notification with the body capped at 100 characters
    /// plus `...`.
    pub fn new(app_name: impl Into<String>, summary: impl Into<String>, body: &str) -> Self {
        Self {
            app_name: app_name.into(),
            summary: summary.into(),
            body: truncate_body(body),
            urgency: Urgency::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNotifications {
    #[serde(default)]
    pub notifications: Vec<AppNotification>,
}

impl AppNotifications {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(APP_NOTIFICATIONS_KEY)
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}
