//! Book and metadata elements for the export-only XML envelope
//!
//! Output is streamed: each element is written directly to the sink as
//! plain escaped text, never assembled into a document tree first.

use crate::archive::ArchiveMetaData;
use crate::model::Book;
use std::io::{self, Write};

/// Escape text for XML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn element<W: Write>(w: &mut W, indent: &str, tag: &str, value: &str) -> io::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    writeln!(w, "{indent}<{tag}>{}</{tag}>", escape(value))
}

/// Write one `<book>` element
pub fn write_book<W: Write>(w: &mut W, book: &Book) -> io::Result<()> {
    writeln!(w, "    <book uuid=\"{}\">", escape(&book.uuid))?;
    element(w, "      ", "title", &book.title)?;
    for author in &book.authors {
        element(w, "      ", "author", author)?;
    }
    element(w, "      ", "series", book.series.as_deref().unwrap_or(""))?;
    element(
        w,
        "      ",
        "series-number",
        book.series_number.as_deref().unwrap_or(""),
    )?;
    element(
        w,
        "      ",
        "publisher",
        book.publisher.as_deref().unwrap_or(""),
    )?;
    element(w, "      ", "isbn", book.isbn.as_deref().unwrap_or(""))?;
    element(
        w,
        "      ",
        "description",
        book.description.as_deref().unwrap_or(""),
    )?;
    element(w, "      ", "notes", book.notes.as_deref().unwrap_or(""))?;
    if let Some(rating) = book.rating {
        element(w, "      ", "rating", &rating.to_string())?;
    }
    element(w, "      ", "read", if book.read { "true" } else { "" })?;
    element(w, "      ", "date-added", &book.date_added.to_rfc3339())?;
    element(
        w,
        "      ",
        "last-modified",
        &book.last_modified.to_rfc3339(),
    )?;
    writeln!(w, "    </book>")
}

/// Write the `<metadata>` block (closes the envelope's second child)
pub fn write_metadata<W: Write>(w: &mut W, meta: &ArchiveMetaData) -> io::Result<()> {
    writeln!(w, "  <metadata version=\"{}\">", meta.version)?;
    element(w, "    ", "created", &meta.created.to_rfc3339())?;
    if let Some(count) = meta.book_count {
        element(w, "    ", "book-count", &count.to_string())?;
    }
    if let Some(count) = meta.cover_count {
        element(w, "    ", "cover-count", &count.to_string())?;
    }
    writeln!(w, "  </metadata>")
}
