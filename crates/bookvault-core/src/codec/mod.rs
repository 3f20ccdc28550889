//! Per-format record codecs
//!
//! Each codec handles one (record kind, format) pair: books as CSV rows,
//! books/styles/preferences as JSON, and the export-only XML elements.
//! Decoders are tolerant per record: a malformed row or element is reported
//! in the returned failure count, never as an error that aborts the batch.

pub mod csv;
pub mod json;
pub mod xml;

use crate::model::{Book, BooklistStyle};

/// Outcome of decoding a batch of book records
#[derive(Debug, Default)]
pub struct DecodedBooks {
    pub books: Vec<Book>,
    /// Records that failed to decode and were dropped
    pub failed: usize,
}

/// Outcome of decoding a batch of style records
#[derive(Debug, Default)]
pub struct DecodedStyles {
    pub styles: Vec<BooklistStyle>,
    /// Records that failed to decode and were dropped
    pub failed: usize,
}
