use super::ViewState;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarView {
    Month { year: i32, month: u32 },
    Day { date: NaiveDate },
    AddEvent { date: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarEvent {
    NextMonth,
    PreviousMonth,
    /// Day of the displayed month; out-of-range days are ignored.
    SelectDay(u32),
    StartAdd,
    /// Event saved or add cancelled.
    FinishAdd,
    Back,
}

impl CalendarView {
    pub fn month_of(date: NaiveDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl ViewState for CalendarView {
    type Event = CalendarEvent;

    fn transition(self, event: CalendarEvent) -> Self {
        match (self, event) {
            (Self::Month { year, month }, CalendarEvent::NextMonth) => {
                if month == 12 {
                    Self::Month { year: year + 1, month: 1 }
                } else {
                    Self::Month { year, month: month + 1 }
                }
            }
            (Self::Month { year, month }, CalendarEvent::PreviousMonth) => {
                if month <= 1 {
                    Self::Month { year: year - 1, month: 12 }
                } else {
                    Self::Month { year, month: month - 1 }
                }
            }
            (Self::Month { year, month }, CalendarEvent::SelectDay(day)) => {
                match NaiveDate::from_ymd_opt(year, month, day) {
                    Some(date) => Self::Day { date },
                    None => self,
                }
            }
            (Self::Day { date }, CalendarEvent::StartAdd) => Self::AddEvent { date },
            (Self::Day { date }, CalendarEvent::Back) => Self::month_of(date),
            (Self::AddEvent { date }, CalendarEvent::FinishAdd | CalendarEvent::Back) => {
                Self::Day { date }
            }
            (state, _) => state,
        }
    }
}
