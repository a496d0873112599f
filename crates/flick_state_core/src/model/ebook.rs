//! `ebook_positions.json`: last page and font size per book.

use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const EBOOK_POSITIONS_KEY: &str = "ebook_positions.json";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingPosition {
    #[serde(default)]
    pub page: u32,
    #[serde(rename = "fontSize", default = "default_font_size")]
    pub font_size: f64,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl Default for ReadingPosition {
    fn default() -> Self {
        Self {
            page: 0,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Book path to reading position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EbookPositions {
    books: BTreeMap<String, ReadingPosition>,
}

impl EbookPositions {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(EBOOK_POSITIONS_KEY)
    }

    /// Stored position, or page 0 at the default font size.
    pub fn position(&self, book_path: &str) -> ReadingPosition {
        self.books.get(book_path).copied().unwrap_or_default()
    }

    pub fn set_position(&mut self, book_path: impl Into<String>, position: ReadingPosition) {
        self.books.insert(book_path.into(), position);
    }

    pub fn forget(&mut self, book_path: &str) -> bool {
        self.books.remove(book_path).is_some()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
