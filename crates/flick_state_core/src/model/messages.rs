//! `messages.json`: SMS conversations.
//!
//! # Invariants
//! - Conversations are matched by normalized phone number.
//! - New conversations store the normalized number.
//! - Conversations stay sorted by `last_message_time`, newest first.
//! - The same text within 120 s of an existing message is a duplicate.

use crate::store::DocumentKey;
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MESSAGES_KEY: &str = "messages.json";
pub const DUPLICATE_WINDOW_SECS: i64 = 120;

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid digit regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Delivered,
    Sent,
    Failed,
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub direction: Direction,
    /// ISO-8601 local or offset timestamp; may be empty.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(
        text: impl Into<String>,
        direction: Direction,
        timestamp: impl Into<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            text: text.into(),
            direction,
            timestamp: timestamp.into(),
            status,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub phone_number: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: String,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of [`MessagesDocument::add_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesDocument {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessagesDocument {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(MESSAGES_KEY)
    }

    pub fn conversation(&self, phone_number: &str) -> Option<&Conversation> {
        let wanted = normalize_phone_number(phone_number);
        self.conversations
            .iter()
            .find(|conversation| normalize_phone_number(&conversation.phone_number) == wanted)
    }

    /// Appends `message` to the conversation with `phone_number`, creating
    /// it when needed. `contact_name` names a new conversation; without it
    /// the normalized number is used.
    pub fn add_message(
        &mut self,
        phone_number: &str,
        message: Message,
        contact_name: Option<&str>,
    ) -> AddOutcome {
        let normalized = normalize_phone_number(phone_number);
        let position = self
            .conversations
            .iter()
            .position(|conversation| {
                normalize_phone_number(&conversation.phone_number) == normalized
            });
        let index = match position {
            Some(index) => index,
            None => {
                self.conversations.push(Conversation {
                    phone_number: normalized.clone(),
                    contact_name: contact_name.unwrap_or(&normalized).to_string(),
                    last_message: String::new(),
                    last_message_time: String::new(),
                    unread_count: 0,
                    messages: Vec::new(),
                    extra: Map::new(),
                });
                self.conversations.len() - 1
            }
        };

        let conversation = &mut self.conversations[index];
        if conversation
            .messages
            .iter()
            .any(|existing| is_duplicate(existing, &message.text, &message.timestamp))
        {
            return AddOutcome::Duplicate;
        }

        conversation.last_message = message.text.clone();
        conversation.last_message_time = message.timestamp.clone();
        if message.direction == Direction::Incoming {
            conversation.unread_count += 1;
        }
        conversation.messages.push(message);

        self.conversations
            .sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        AddOutcome::Added
    }

    /// Clears the unread counter; returns whether the conversation exists.
    pub fn mark_read(&mut self, phone_number: &str) -> bool {
        let wanted = normalize_phone_number(phone_number);
        match self
            .conversations
            .iter_mut()
            .find(|conversation| normalize_phone_number(&conversation.phone_number) == wanted)
        {
            Some(conversation) => {
                conversation.unread_count = 0;
                true
            }
            None => false,
        }
    }

    pub fn unread_total(&self) -> u32 {
        self.conversations
            .iter()
            .map(|conversation| conversation.unread_count)
            .sum()
    }
}

/// Digits only; an 11-digit number with a leading US `1` drops it, so
/// `+1 (541) 799-9824` and `5417999824` match.
pub fn normalize_phone_number(raw: &str) -> String {
    let digits = NON_DIGIT_RE.replace_all(raw, "");
    match digits.strip_prefix('1') {
        Some(national) if digits.len() == 11 => national.to_string(),
        _ => digits.to_string(),
    }
}

/// Same text and (same timestamp, or within the duplicate window, or a
/// timestamp missing on either side). Direction is ignored.
pub fn is_duplicate(existing: &Message, text: &str, timestamp: &str) -> bool {
    if existing.text != text {
        return false;
    }
    if existing.timestamp == timestamp {
        return true;
    }
    match (parse_timestamp(&existing.timestamp), parse_timestamp(timestamp)) {
        (Some(a), Some(b)) => (a - b).abs() < DUPLICATE_WINDOW_SECS,
        _ => existing.timestamp.is_empty() || timestamp.is_empty(),
    }
}

/// Current local time as an ISO-8601 string with microseconds.
pub fn iso_timestamp_now() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Seconds since the epoch; naive timestamps are read as UTC.
fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|parsed| parsed.and_utc().timestamp())
}
