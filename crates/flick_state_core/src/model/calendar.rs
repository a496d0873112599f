//! `calendar.json`: events keyed by `YYYY-MM-DD`.
//!
//! # Invariants
//! - Each event's `date` equals the key it is stored under.
//! - Events of one day are kept ordered by `time`; untimed (all-day)
//!   events sort first.
//! - A day with no events left is removed from the map.

use super::ModelError;
use crate::store::DocumentKey;
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const CALENDAR_KEY: &str = "calendar.json";
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    /// `HH:MM`, or empty for all-day events.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDocument {
    days: BTreeMap<String, Vec<CalendarEvent>>,
}

/// Canonical map key for `date`.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` key.
pub fn parse_date_key(raw: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_KEY_FORMAT)
        .map_err(|_| ModelError::InvalidDate(raw.to_string()))
}

impl CalendarDocument {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(CALENDAR_KEY)
    }

    pub fn events_on(&self, date: NaiveDate) -> &[CalendarEvent] {
        self.events_on_key(&date_key(date))
    }

    /// Events stored under a raw key; unknown or malformed keys yield an
    /// empty slice.
    pub fn events_on_key(&self, key: &str) -> &[CalendarEvent] {
        self.days.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds one event and returns its index within the day.
    ///
    /// # Errors
    /// - `EmptyField("title")` for a blank title.
    /// - `InvalidTime` unless `time` is empty or `HH:MM`.
    pub fn add_event(
        &mut self,
        date: NaiveDate,
        title: &str,
        time: &str,
    ) -> Result<usize, ModelError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ModelError::EmptyField("title"));
        }
        let time = normalize_time(time)?;
        let key = date_key(date);

        let event = CalendarEvent {
            title: title.to_string(),
            time,
            date: key.clone(),
            extra: Map::new(),
        };
        let day = self.days.entry(key).or_default();
        let index = day.partition_point(|existing| existing.time <= event.time);
        day.insert(index, event);
        Ok(index)
    }

    /// Removes the event at `index` on `date`.
    pub fn remove_event(&mut self, date: NaiveDate, index: usize) -> Option<CalendarEvent> {
        let key = date_key(date);
        let day = self.days.get_mut(&key)?;
        if index >= day.len() {
            return None;
        }
        let removed = day.remove(index);
        if day.is_empty() {
            self.days.remove(&key);
        }
        Some(removed)
    }

    /// Dates that have at least one event, ascending.
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.days
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(key, _)| key.as_str())
    }

    /// Days of `year`-`month` that have events, for month-grid markers.
    pub fn busy_days_in_month(&self, year: i32, month: u32) -> Vec<u32> {
        self.dates()
            .filter_map(|key| parse_date_key(key).ok())
            .filter(|date| date.year() == year && date.month() == month)
            .map(|date| date.day())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dates().next().is_none()
    }
}

fn normalize_time(raw: &str) -> Result<String, ModelError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map(|time| time.format(TIME_FORMAT).to_string())
        .map_err(|_| ModelError::InvalidTime(raw.to_string()))
}
