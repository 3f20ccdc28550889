//! Data-access boundary for books, styles, and preferences
//!
//! The pipeline never looks up storage globally; callers hand it these
//! capabilities explicitly. A real implementation wraps the application
//! database; `MemoryCatalogue` backs tests and embedders without one.
//!
//! Implementations must commit per record (or in small batches). The
//! pipeline may be cancelled between any two records, and the local state
//! must stay consistent as a partial import, never an all-or-nothing lock.

use crate::error::Result;
use crate::model::{AppPreferences, Book, BooklistStyle};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Book storage capability
pub trait BookStore {
    /// All books, in stable (UUID) order
    fn all_books(&self) -> Result<Vec<Book>>;

    /// Books modified strictly after the given instant
    fn books_modified_since(&self, since: DateTime<Utc>) -> Result<Vec<Book>> {
        Ok(self
            .all_books()?
            .into_iter()
            .filter(|b| b.last_modified > since)
            .collect())
    }

    /// Look up a book by its stable UUID
    fn find_by_uuid(&self, uuid: &str) -> Result<Option<Book>>;

    /// Insert a new book
    fn insert_book(&mut self, book: &Book) -> Result<()>;

    /// Replace an existing book's fields
    fn update_book(&mut self, book: &Book) -> Result<()>;

    /// Number of stored books
    fn book_count(&self) -> usize;
}

/// Booklist style storage capability
pub trait StyleStore {
    /// All user-defined styles
    fn all_styles(&self) -> Result<Vec<BooklistStyle>>;

    /// Insert or replace a style by UUID
    fn upsert_style(&mut self, style: &BooklistStyle) -> Result<()>;
}

/// Preference storage capability
pub trait PreferenceStore {
    /// Snapshot the current preferences
    fn preferences(&self) -> Result<AppPreferences>;

    /// Replace stored preferences with the imported set
    fn restore_preferences(&mut self, prefs: &AppPreferences) -> Result<()>;
}

/// The full data-access surface the pipeline needs
pub trait Catalogue: BookStore + StyleStore + PreferenceStore {}

impl<T: BookStore + StyleStore + PreferenceStore> Catalogue for T {}

/// In-memory catalogue for tests and database-less embedders
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalogue {
    books: BTreeMap<String, Book>,
    styles: BTreeMap<String, BooklistStyle>,
    preferences: AppPreferences,
}

impl MemoryCatalogue {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a book directly, replacing any record with the same UUID
    pub fn put_book(&mut self, book: Book) {
        self.books.insert(book.uuid.clone(), book);
    }

    /// Remove a book by UUID, returning it if present
    pub fn remove_book(&mut self, uuid: &str) -> Option<Book> {
        self.books.remove(uuid)
    }

    /// Insert a style directly
    pub fn put_style(&mut self, style: BooklistStyle) {
        self.styles.insert(style.uuid.clone(), style);
    }

    /// Mutable access to the stored preferences
    pub fn preferences_mut(&mut self) -> &mut AppPreferences {
        &mut self.preferences
    }
}

impl BookStore for MemoryCatalogue {
    fn all_books(&self) -> Result<Vec<Book>> {
        Ok(self.books.values().cloned().collect())
    }

    fn find_by_uuid(&self, uuid: &str) -> Result<Option<Book>> {
        Ok(self.books.get(uuid).cloned())
    }

    fn insert_book(&mut self, book: &Book) -> Result<()> {
        self.books.insert(book.uuid.clone(), book.clone());
        Ok(())
    }

    fn update_book(&mut self, book: &Book) -> Result<()> {
        self.books.insert(book.uuid.clone(), book.clone());
        Ok(())
    }

    fn book_count(&self) -> usize {
        self.books.len()
    }
}

impl StyleStore for MemoryCatalogue {
    fn all_styles(&self) -> Result<Vec<BooklistStyle>> {
        Ok(self.styles.values().cloned().collect())
    }

    fn upsert_style(&mut self, style: &BooklistStyle) -> Result<()> {
        self.styles.insert(style.uuid.clone(), style.clone());
        Ok(())
    }
}

impl PreferenceStore for MemoryCatalogue {
    fn preferences(&self) -> Result<AppPreferences> {
        Ok(self.preferences.clone())
    }

    fn restore_preferences(&mut self, prefs: &AppPreferences) -> Result<()> {
        self.preferences = prefs.clone();
        Ok(())
    }
}
