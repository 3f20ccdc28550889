//! Result accumulators for export and import operations
//!
//! One instance per pipeline invocation, owned by the pipeline and returned
//! to the caller at completion. Partial success (some records skipped or
//! failed) is still a successful completion; `cancelled` reports a
//! cooperative stop rather than an error.

use serde::{Deserialize, Serialize};

/// Aggregate outcome of one export operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportResults {
    /// Number of books written to the archive
    pub book_count: usize,
    /// UUIDs of the exported books, for "since last backup" bookkeeping
    pub exported_uuids: Vec<String>,
    /// Number of cover image files written
    pub cover_count: usize,
    /// Number of booklist styles written
    pub style_count: usize,
    /// Whether a preferences record was written
    pub has_preferences: bool,
    /// Whether a database snapshot was written
    pub has_database: bool,
    /// Whether the operation was cancelled before completion
    pub cancelled: bool,
}

impl ExportResults {
    /// Record one exported book
    pub fn add_book(&mut self, uuid: &str) {
        self.book_count += 1;
        self.exported_uuids.push(uuid.to_string());
    }

    /// Whether the operation ran to completion
    pub fn is_complete(&self) -> bool {
        !self.cancelled
    }
}

/// Aggregate outcome of one import operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResults {
    /// Books seen and decoded, regardless of outcome
    pub books_processed: usize,
    /// Books inserted (no existing record with that UUID)
    pub books_created: usize,
    /// Books whose existing record was replaced
    pub books_updated: usize,
    /// Books left untouched by the update policy
    pub books_skipped: usize,
    /// Rows/elements that failed to decode; outside the conservation sum
    pub books_failed: usize,
    /// Cover image files saved
    pub cover_count: usize,
    /// Booklist styles imported
    pub style_count: usize,
    /// Style payloads or elements that failed to decode; outside the
    /// conservation sum
    pub styles_failed: usize,
    /// Whether a preferences record was restored
    pub has_preferences: bool,
    /// Whether the operation was cancelled before completion
    pub cancelled: bool,
}

impl ImportResults {
    /// Conservation invariant: every processed book is accounted for as
    /// created, updated, or skipped.
    pub fn is_consistent(&self) -> bool {
        self.books_created + self.books_updated + self.books_skipped == self.books_processed
    }

    /// Whether the operation ran to completion
    pub fn is_complete(&self) -> bool {
        !self.cancelled
    }
}
