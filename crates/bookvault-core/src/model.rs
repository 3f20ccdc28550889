//! Domain records: books, booklist styles, and application preferences
//!
//! Every record carries a stable UUID as its portable identity. Local
//! database row ids never travel inside an archive because they are not
//! stable across installations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single book record
///
/// All non-identity fields are `#[serde(default)]` so archives written by
/// older versions (with fewer columns/fields) decode with defaults instead
/// of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Stable identity, portable across installations
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub series_number: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub read: bool,
    #[serde(default = "epoch")]
    pub date_added: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub last_modified: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Book {
    /// Create a new book with a fresh UUID and current timestamps
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            authors: Vec::new(),
            series: None,
            series_number: None,
            publisher: None,
            isbn: None,
            description: None,
            notes: None,
            rating: None,
            read: false,
            date_added: now,
            last_modified: now,
        }
    }

    /// Add an author, builder-style
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Set the ISBN, builder-style
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Bump `last_modified` to now
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// A booklist style: a named, user-tunable set of list display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooklistStyle {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_preferred: bool,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl BooklistStyle {
    /// Create a new style with a fresh UUID
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            is_preferred: false,
            settings: BTreeMap::new(),
        }
    }
}

/// Flat key/value application preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl AppPreferences {
    /// Number of stored preference keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether no preferences are stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set a preference value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a preference value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_has_uuid() {
        let book = Book::new("Dune");
        assert!(!book.uuid.is_empty());
        assert_eq!(book.title, "Dune");
        assert!(!book.read);
    }

    #[test]
    fn test_touch_advances_modified() {
        let mut book = Book::new("Dune");
        let before = book.last_modified;
        book.touch();
        assert!(book.last_modified >= before);
    }

    #[test]
    fn test_book_decodes_with_missing_fields() {
        // Only identity present; everything else defaults
        let book: Book = serde_json::from_str(r#"{"uuid":"abc"}"#).unwrap();
        assert_eq!(book.uuid, "abc");
        assert!(book.title.is_empty());
        assert_eq!(book.date_added, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_preferences_roundtrip() {
        let mut prefs = AppPreferences::default();
        prefs.set("ui.theme", "dark");
        let json = serde_json::to_string(&prefs).unwrap();
        let back: AppPreferences = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("ui.theme"), Some("dark"));
    }
}
