//! Calendar use-case service.
//!
//! # Invariants
//! - Every mutation rewrites the full `calendar.json` document.
//! - Validation happens before the write; a rejected event leaves the file
//!   untouched.

use super::ServiceResult;
use crate::model::calendar::{CalendarDocument, CalendarEvent};
use crate::store::StateStore;
use chrono::NaiveDate;
use log::info;

pub struct CalendarService {
    store: StateStore,
}

impl CalendarService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Current document; missing or corrupt files read as empty.
    pub fn document(&self) -> CalendarDocument {
        self.store.read_or_default(&CalendarDocument::key())
    }

    pub fn events_for(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.document().events_on(date).to_vec()
    }

    /// Adds an event and returns its index within the day.
    ///
    /// # Errors
    /// - `ServiceError::Invalid` for a blank title or malformed time.
    /// - `ServiceError::Store` when the document cannot be written.
    pub fn add_event(&self, date: NaiveDate, title: &str, time: &str) -> ServiceResult<usize> {
        let mut document = self.document();
        let index = document.add_event(date, title, time)?;
        self.store.write(&CalendarDocument::key(), &document)?;
        info!("event=calendar_add module=service status=ok date={date} index={index}");
        Ok(index)
    }

    /// Removes the event at `index`; `None` when there is no such event.
    pub fn remove_event(
        &self,
        date: NaiveDate,
        index: usize,
    ) -> ServiceResult<Option<CalendarEvent>> {
        let mut document = self.document();
        let Some(removed) = document.remove_event(date, index) else {
            return Ok(None);
        };
        self.store.write(&CalendarDocument::key(), &document)?;
        info!("event=calendar_remove module=service status=ok date={date} index={index}");
        Ok(Some(removed))
    }

    pub fn busy_days(&self, year: i32, month: u32) -> Vec<u32> {
        self.document().busy_days_in_month(year, month)
    }
}
