use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Ephemeral request written once and consumed at most once.
///
/// Fields other than `action`, `data` and `timestamp` are kept in `extra`
/// so flat commands such as `{"action":"dial","number":"..."}` survive a
/// round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default = "empty_object")]
    pub data: Value,
    /// Unix epoch milliseconds at send time; `0` when the sender omitted it.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Command {
    /// Creates a command with empty `data` stamped with the current time.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: empty_object(),
            timestamp: now_epoch_ms(),
            extra: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Adds a top-level field next to `action` (legacy flat layout).
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// String field from `data`, falling back to the top-level layout.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data
            .get(name)
            .or_else(|| self.extra.get(name))
            .and_then(Value::as_str)
    }

    /// Boolean counterpart of [`Command::str_field`].
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.data
            .get(name)
            .or_else(|| self.extra.get(name))
            .and_then(Value::as_bool)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Current Unix time in milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
