//! Typed schemas for the documents shared through the state directory.
//!
//! # Responsibility
//! - Give each well-known document a serde model and its domain helpers.
//! - Preserve keys this crate does not model when documents are rewritten.
//!
//! # Invariants
//! - Every schema deserializes from `{}` (or `[]` for list documents) so a
//!   missing document maps to an empty model.
//! - Unknown fields round-trip through `extra` maps.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod calendar;
pub mod calls;
pub mod contacts;
pub mod display;
pub mod ebook;
pub mod lock;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod vault;

/// Validation failure when mutating a document model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    EmptyField(&'static str),
    InvalidTime(String),
    InvalidDate(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
        }
    }
}

impl Error for ModelError {}
