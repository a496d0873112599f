//! `contacts.json`: address book used to name conversations.

use super::messages::normalize_phone_number;
use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONTACTS_KEY: &str = "contacts.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub initials: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            initials: initials(&name),
            name,
            phone: phone.into(),
            email: String::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsDocument {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContactsDocument {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(CONTACTS_KEY)
    }

    /// First contact whose normalized phone matches; empty numbers never
    /// match.
    pub fn lookup(&self, phone_number: &str) -> Option<&Contact> {
        let wanted = normalize_phone_number(phone_number);
        if wanted.is_empty() {
            return None;
        }
        self.contacts
            .iter()
            .find(|contact| normalize_phone_number(&contact.phone) == wanted)
    }

    /// Replaces the contact with the same normalized phone, or appends.
    pub fn upsert(&mut self, contact: Contact) {
        let wanted = normalize_phone_number(&contact.phone);
        let existing = self
            .contacts
            .iter_mut()
            .find(|c| !wanted.is_empty() && normalize_phone_number(&c.phone) == wanted);
        match existing {
            Some(slot) => *slot = contact,
            None => self.contacts.push(contact),
        }
    }
}

/// Up to two uppercase initials from the first two words; `?` when the
/// name has none.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}
