//! Per-app screen state machines.
//!
//! # Responsibility
//! - Model each app's screens as a closed enum with a pure transition
//!   function, independent of any UI toolkit.
//!
//! # Invariants
//! - `transition` performs no I/O.
//! - An event that does not apply to the current state returns the state
//!   unchanged.

pub mod calendar;
pub mod lock;
pub mod messages;
pub mod vault;

pub use calendar::{CalendarEvent as CalendarViewEvent, CalendarView};
pub use lock::{LockEvent, LockView};
pub use messages::{MessagesEvent, MessagesView};
pub use vault::{VaultEvent, VaultView};

/// Screen state driven by discrete UI or daemon events.
pub trait ViewState: Sized {
    type Event;

    fn transition(self, event: Self::Event) -> Self;

    /// Applies events in order.
    fn replay<I>(self, events: I) -> Self
    where
        I: IntoIterator<Item = Self::Event>,
    {
        events
            .into_iter()
            .fold(self, |state, event| state.transition(event))
    }
}
