//! XML container (export-only)
//!
//! A single `<NeverTooManyBooks version="..">` envelope wrapping exactly two
//! blocks: Books, then MetaData. The reversed metadata position relative to
//! the TAR/JSON containers is intentional and part of the format; the writer
//! accepts `put_metadata` first like every other container and defers the
//! block to `finish()`.
//!
//! Blocks are streamed directly to the output as they arrive; the document
//! is never assembled in memory, since a full catalogue can be large.

use crate::archive::{ArchiveMetaData, ArchiveWriter, ContainerFormat};
use crate::codec;
use crate::error::{classify_io, Error, Result};
use crate::model::{AppPreferences, Book, BooklistStyle};
use crate::record::RecordType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Root element name, kept for compatibility with existing consumers
pub const XML_ROOT: &str = "NeverTooManyBooks";

/// Streaming writer for the XML export envelope
pub struct XmlArchiveWriter {
    out: Option<BufWriter<File>>,
    deferred_meta: Option<ArchiveMetaData>,
}

impl XmlArchiveWriter {
    /// Create a new XML export at `path` and write the envelope opening
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(classify_io)?;
        let mut out = BufWriter::new(file);
        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>").map_err(classify_io)?;
        writeln!(
            out,
            "<{XML_ROOT} version=\"{}\">",
            crate::archive::ARCHIVE_VERSION
        )
        .map_err(classify_io)?;
        Ok(Self {
            out: Some(out),
            deferred_meta: None,
        })
    }

    fn out(&mut self) -> Result<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| Error::Other("XML writer already finished".to_string()))
    }
}

impl ArchiveWriter for XmlArchiveWriter {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Xml
    }

    fn supports(&self, record_type: RecordType) -> bool {
        matches!(
            record_type.canonical(),
            RecordType::MetaData | RecordType::Books
        )
    }

    fn put_metadata(&mut self, meta: &ArchiveMetaData) -> Result<()> {
        // Books come first in this envelope; hold the block until finish
        self.deferred_meta = Some(meta.clone());
        Ok(())
    }

    fn put_books(&mut self, books: &[Book]) -> Result<usize> {
        let out = self.out()?;
        writeln!(out, "  <books count=\"{}\">", books.len()).map_err(classify_io)?;
        for book in books {
            codec::xml::write_book(out, book).map_err(classify_io)?;
        }
        writeln!(out, "  </books>").map_err(classify_io)?;
        Ok(books.len())
    }

    fn put_styles(&mut self, _styles: &[BooklistStyle]) -> Result<usize> {
        Err(Error::UnsupportedRecordType(RecordType::Styles.label()))
    }

    fn put_preferences(&mut self, _prefs: &AppPreferences) -> Result<()> {
        Err(Error::UnsupportedRecordType(RecordType::Preferences.label()))
    }

    fn put_file(&mut self, record_type: RecordType, _name: &str, _data: &[u8]) -> Result<()> {
        Err(Error::UnsupportedRecordType(record_type.label()))
    }

    fn put_xml_data(&mut self, _name: &str, _data: &[u8]) -> Result<()> {
        Err(Error::UnsupportedRecordType(RecordType::Database.label()))
    }

    fn finish(&mut self) -> Result<()> {
        let meta = self.deferred_meta.take();
        let out = self.out()?;
        if let Some(meta) = meta {
            codec::xml::write_metadata(out, &meta).map_err(classify_io)?;
        }
        writeln!(out, "</{XML_ROOT}>").map_err(classify_io)?;
        out.flush().map_err(classify_io)?;
        self.out = None;
        Ok(())
    }
}
