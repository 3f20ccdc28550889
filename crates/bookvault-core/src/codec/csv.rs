//! Books as CSV rows
//!
//! The header row defines column order explicitly; decoding resolves every
//! column by header name, never by position, so columns can be added in
//! later versions without breaking older readers. A row that fails to
//! decode is dropped and counted, and the rest of the batch continues.

use super::DecodedBooks;
use crate::error::Result;
use crate::model::Book;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Column names, in written order
const COLUMNS: [&str; 13] = [
    "uuid",
    "title",
    "authors",
    "series",
    "series_number",
    "publisher",
    "isbn",
    "description",
    "notes",
    "rating",
    "read",
    "date_added",
    "last_modified",
];

/// Separator used inside the multi-valued authors column
const AUTHOR_SEPARATOR: char = '|';

/// Encode a batch of books to CSV bytes, header row first
pub fn encode_books(books: &[Book]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;

    for book in books {
        writer.write_record([
            book.uuid.as_str(),
            book.title.as_str(),
            &book.authors.join(&AUTHOR_SEPARATOR.to_string()),
            book.series.as_deref().unwrap_or(""),
            book.series_number.as_deref().unwrap_or(""),
            book.publisher.as_deref().unwrap_or(""),
            book.isbn.as_deref().unwrap_or(""),
            book.description.as_deref().unwrap_or(""),
            book.notes.as_deref().unwrap_or(""),
            &book.rating.map(|r| r.to_string()).unwrap_or_default(),
            if book.read { "1" } else { "0" },
            &book.date_added.to_rfc3339(),
            &book.last_modified.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::error::Error::Other(format!("CSV flush failed: {e}")))
}

/// Decode a batch of books from CSV bytes.
///
/// Columns absent from the header decode as defaults. Rows that cannot be
/// decoded at all (no UUID, malformed quoting) are counted in `failed`.
pub fn decode_books(data: &[u8]) -> Result<DecodedBooks> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let header_index: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_ascii_lowercase(), i))
        .collect();

    let mut decoded = DecodedBooks::default();

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("dropping malformed CSV row: {e}");
                decoded.failed += 1;
                continue;
            }
        };

        match row_to_book(&record, &header_index) {
            Some(book) => decoded.books.push(book),
            None => {
                tracing::warn!("dropping CSV row without a usable uuid");
                decoded.failed += 1;
            }
        }
    }

    Ok(decoded)
}

fn field<'a>(
    record: &'a csv::StringRecord,
    header_index: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    header_index
        .get(name)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn row_to_book(record: &csv::StringRecord, index: &HashMap<String, usize>) -> Option<Book> {
    // Identity is mandatory; everything else defaults
    let uuid = field(record, index, "uuid")?.to_string();

    let parse_date = |name: &str| {
        field(record, index, name)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH)
    };

    Some(Book {
        uuid,
        title: field(record, index, "title").unwrap_or("").to_string(),
        authors: field(record, index, "authors")
            .map(|v| {
                v.split(AUTHOR_SEPARATOR)
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        series: field(record, index, "series").map(String::from),
        series_number: field(record, index, "series_number").map(String::from),
        publisher: field(record, index, "publisher").map(String::from),
        isbn: field(record, index, "isbn").map(String::from),
        description: field(record, index, "description").map(String::from),
        notes: field(record, index, "notes").map(String::from),
        rating: field(record, index, "rating").and_then(|v| v.parse().ok()),
        read: matches!(field(record, index, "read"), Some("1") | Some("true")),
        date_added: parse_date("date_added"),
        last_modified: parse_date("last_modified"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        let mut book = Book::new("Dune")
            .with_author("Frank Herbert")
            .with_isbn("9780441172719");
        book.series = Some("Dune".to_string());
        book.series_number = Some("1".to_string());
        book.rating = Some(4.5);
        book.read = true;
        book.notes = Some("a classic, with \"quotes\" and, commas".to_string());
        book
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let original = sample();
        let bytes = encode_books(std::slice::from_ref(&original)).unwrap();
        let decoded = decode_books(&bytes).unwrap();

        assert_eq!(decoded.failed, 0);
        assert_eq!(decoded.books.len(), 1);
        let book = &decoded.books[0];
        assert_eq!(book.uuid, original.uuid);
        assert_eq!(book.authors, original.authors);
        assert_eq!(book.rating, Some(4.5));
        assert!(book.read);
        assert_eq!(book.notes, original.notes);
        // RFC3339 round-trips to the same instant
        assert_eq!(book.last_modified, original.last_modified);
    }

    #[test]
    fn test_missing_columns_decode_as_defaults() {
        let csv = "uuid,title\nabc-123,Dune\n";
        let decoded = decode_books(csv.as_bytes()).unwrap();
        assert_eq!(decoded.books.len(), 1);
        let book = &decoded.books[0];
        assert_eq!(book.uuid, "abc-123");
        assert_eq!(book.title, "Dune");
        assert!(book.authors.is_empty());
        assert!(!book.read);
        assert_eq!(book.date_added, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_header_order_does_not_matter() {
        let csv = "title,uuid\nDune,abc-123\n";
        let decoded = decode_books(csv.as_bytes()).unwrap();
        assert_eq!(decoded.books[0].uuid, "abc-123");
        assert_eq!(decoded.books[0].title, "Dune");
    }

    #[test]
    fn test_row_without_uuid_is_counted_failed() {
        let csv = "uuid,title\n,No Identity\nabc,Fine\n";
        let decoded = decode_books(csv.as_bytes()).unwrap();
        assert_eq!(decoded.failed, 1);
        assert_eq!(decoded.books.len(), 1);
        assert_eq!(decoded.books[0].title, "Fine");
    }

    #[test]
    fn test_multiple_authors_roundtrip() {
        let book = Book::new("Good Omens")
            .with_author("Terry Pratchett")
            .with_author("Neil Gaiman");
        let bytes = encode_books(&[book]).unwrap();
        let decoded = decode_books(&bytes).unwrap();
        assert_eq!(
            decoded.books[0].authors,
            vec!["Terry Pratchett", "Neil Gaiman"]
        );
    }
}
