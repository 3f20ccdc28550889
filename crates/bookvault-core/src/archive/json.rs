//! JSON container
//!
//! One JSON document per archive: `{ "info": .., "books": .., "styles": ..,
//! "preferences": .. }`. The reader yields synthetic entities in document
//! order with the info section first, so the metadata-first protocol holds
//! exactly as it does for TAR. Covers and database snapshots are not
//! representable in this container.

use crate::archive::{names, ArchiveMetaData, ArchiveReader, ArchiveWriter};
use crate::archive::{ContainerFormat, EntityFlow, ReaderEntity};
use crate::error::{classify_io, Error, Result};
use crate::model::{AppPreferences, Book, BooklistStyle};
use crate::record::RecordType;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writer for single-document JSON archives
pub struct JsonArchiveWriter {
    path: PathBuf,
    root: Map<String, Value>,
    finished: bool,
}

impl JsonArchiveWriter {
    /// Create a new JSON archive at `path`
    pub fn create(path: &Path) -> Result<Self> {
        // Fail early if the destination is not writable
        File::create(path).map_err(classify_io)?;
        Ok(Self {
            path: path.to_path_buf(),
            root: Map::new(),
            finished: false,
        })
    }
}

impl ArchiveWriter for JsonArchiveWriter {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Json
    }

    fn supports(&self, record_type: RecordType) -> bool {
        matches!(
            record_type.canonical(),
            RecordType::MetaData
                | RecordType::Books
                | RecordType::Styles
                | RecordType::Preferences
        )
    }

    fn put_metadata(&mut self, meta: &ArchiveMetaData) -> Result<()> {
        self.root.insert("info".to_string(), serde_json::to_value(meta)?);
        Ok(())
    }

    fn put_books(&mut self, books: &[Book]) -> Result<usize> {
        let value = serde_json::to_value(books)?;
        match self.root.get_mut("books") {
            // Append to an earlier batch
            Some(Value::Array(existing)) => {
                if let Value::Array(new) = value {
                    existing.extend(new);
                }
            }
            _ => {
                self.root.insert("books".to_string(), value);
            }
        }
        Ok(books.len())
    }

    fn put_styles(&mut self, styles: &[BooklistStyle]) -> Result<usize> {
        self.root
            .insert("styles".to_string(), serde_json::to_value(styles)?);
        Ok(styles.len())
    }

    fn put_preferences(&mut self, prefs: &AppPreferences) -> Result<()> {
        self.root
            .insert("preferences".to_string(), serde_json::to_value(prefs)?);
        Ok(())
    }

    fn put_file(&mut self, record_type: RecordType, _name: &str, _data: &[u8]) -> Result<()> {
        Err(Error::UnsupportedRecordType(record_type.label()))
    }

    fn put_xml_data(&mut self, _name: &str, _data: &[u8]) -> Result<()> {
        Err(Error::UnsupportedRecordType(RecordType::Database.label()))
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Err(Error::Other("JSON writer already finished".to_string()));
        }
        self.finished = true;

        let file = File::create(&self.path).map_err(classify_io)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &Value::Object(std::mem::take(&mut self.root)))?;
        out.flush().map_err(classify_io)
    }
}

/// Reader for single-document JSON archives
pub struct JsonArchiveReader {
    root: Map<String, Value>,
}

impl JsonArchiveReader {
    /// Open and parse an existing JSON archive
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(classify_io)?;
        let value: Value =
            serde_json::from_reader(file).map_err(|e| Error::InvalidArchive {
                reason: format!("not a readable JSON archive: {e}"),
            })?;
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(Error::InvalidArchive {
                reason: "JSON archive root is not an object".to_string(),
            }),
        }
    }

    fn synthetic(&self, key: &str, name: &str, record_type: RecordType) -> Result<Option<ReaderEntity>> {
        match self.root.get(key) {
            Some(value) => Ok(Some(ReaderEntity {
                name: name.to_string(),
                record_type,
                last_modified: None,
                data: serde_json::to_vec(value)?,
            })),
            None => Ok(None),
        }
    }
}

impl ArchiveReader for JsonArchiveReader {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Json
    }

    fn for_each_entity(
        &mut self,
        visit: &mut dyn FnMut(ReaderEntity) -> Result<EntityFlow>,
    ) -> Result<()> {
        // Fixed document order, info first
        let sections = [
            ("info", names::INFO_JSON, RecordType::MetaData),
            ("books", names::BOOKS_JSON, RecordType::Books),
            ("styles", names::STYLES_JSON, RecordType::Styles),
            ("preferences", names::PREFERENCES_JSON, RecordType::Preferences),
        ];

        for (key, name, record_type) in sections {
            if let Some(entity) = self.synthetic(key, name, record_type)? {
                if visit(entity)? == EntityFlow::Stop {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::first_entity;

    #[test]
    fn test_json_roundtrip_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let books = vec![Book::new("Dune")];
        let styles = vec![BooklistStyle::new("Compact")];
        let mut prefs = AppPreferences::default();
        prefs.set("sort", "author");

        let mut writer = JsonArchiveWriter::create(&path).unwrap();
        writer
            .put_metadata(&ArchiveMetaData::new().with_counts(1, 0))
            .unwrap();
        writer.put_books(&books).unwrap();
        writer.put_styles(&styles).unwrap();
        writer.put_preferences(&prefs).unwrap();
        writer.finish().unwrap();

        let mut reader = JsonArchiveReader::open(&path).unwrap();
        let mut seen = Vec::new();
        reader
            .for_each_entity(&mut |entity| {
                seen.push(entity.record_type);
                Ok(EntityFlow::Continue)
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                RecordType::MetaData,
                RecordType::Books,
                RecordType::Styles,
                RecordType::Preferences,
            ]
        );
        assert!(reader.is_valid());
    }

    #[test]
    fn test_covers_are_not_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut writer = JsonArchiveWriter::create(&path).unwrap();
        assert!(!writer.supports(RecordType::Cover));
        assert!(!writer.supports(RecordType::Database));
        assert!(writer
            .put_file(RecordType::Cover, "covers/x.jpg", &[1])
            .is_err());
    }

    #[test]
    fn test_metadata_first_even_when_written_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut writer = JsonArchiveWriter::create(&path).unwrap();
        writer.put_books(&[Book::new("Dune")]).unwrap();
        writer
            .put_metadata(&ArchiveMetaData::new().with_counts(1, 0))
            .unwrap();
        writer.finish().unwrap();

        let mut reader = JsonArchiveReader::open(&path).unwrap();
        let first = first_entity(&mut reader).unwrap().unwrap();
        assert_eq!(first.record_type, RecordType::MetaData);
    }

    #[test]
    fn test_garbage_file_is_invalid_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.json");
        std::fs::write(&path, b"[1, 2, 3").unwrap();
        assert!(JsonArchiveReader::open(&path).is_err());
    }
}
