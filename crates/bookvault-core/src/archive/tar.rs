//! TAR container
//!
//! Entries are appended from in-memory payloads with synthetic headers;
//! reading walks the entries strictly forward. Each read pass re-opens the
//! file, which keeps the reader trait object-safe and makes metadata-only
//! reads cheap without consuming anything a later full read needs.

use crate::archive::{names, ArchiveMetaData, ArchiveReader, ArchiveWriter};
use crate::archive::{ContainerFormat, EntityFlow, ReaderEntity};
use crate::codec;
use crate::error::{classify_io, Error, Result};
use crate::model::{AppPreferences, Book, BooklistStyle};
use crate::record::RecordType;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header};

/// Writer for TAR archives
pub struct TarArchiveWriter {
    builder: Option<Builder<File>>,
    books_batches: usize,
}

impl TarArchiveWriter {
    /// Create a new TAR archive at `path`, truncating any existing file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(classify_io)?;
        Ok(Self {
            builder: Some(Builder::new(file)),
            books_batches: 0,
        })
    }

    fn builder(&mut self) -> Result<&mut Builder<File>> {
        self.builder
            .as_mut()
            .ok_or_else(|| Error::Other("TAR writer already finished".to_string()))
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(Utc::now().timestamp() as u64);
        self.builder()?
            .append_data(&mut header, name, data)
            .map_err(classify_io)
    }
}

impl ArchiveWriter for TarArchiveWriter {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Tar
    }

    fn supports(&self, record_type: RecordType) -> bool {
        !record_type.is_legacy()
    }

    fn put_metadata(&mut self, meta: &ArchiveMetaData) -> Result<()> {
        let bytes = meta.to_json_bytes()?;
        self.append(names::INFO_JSON, &bytes)
    }

    fn put_books(&mut self, books: &[Book]) -> Result<usize> {
        let bytes = codec::csv::encode_books(books)?;
        self.books_batches += 1;
        let name = if self.books_batches == 1 {
            names::BOOKS_CSV.to_string()
        } else {
            format!("books_{}.csv", self.books_batches)
        };
        self.append(&name, &bytes)?;
        Ok(books.len())
    }

    fn put_styles(&mut self, styles: &[BooklistStyle]) -> Result<usize> {
        let bytes = codec::json::encode_styles(styles)?;
        self.append(names::STYLES_JSON, &bytes)?;
        Ok(styles.len())
    }

    fn put_preferences(&mut self, prefs: &AppPreferences) -> Result<()> {
        let bytes = codec::json::encode_preferences(prefs)?;
        self.append(names::PREFERENCES_JSON, &bytes)
    }

    fn put_file(&mut self, record_type: RecordType, name: &str, data: &[u8]) -> Result<()> {
        if !self.supports(record_type) {
            return Err(Error::UnsupportedRecordType(record_type.label()));
        }
        self.append(name, data)
    }

    fn put_xml_data(&mut self, name: &str, data: &[u8]) -> Result<()> {
        // Same capability check as put_file. The blob may use a legacy entry
        // name; the guard is on the canonical kind it carries.
        let record_type = RecordType::from_entry_name(name).ok_or_else(|| {
            Error::Other(format!("entry name maps to no record type: {name}"))
        })?;
        if !self.supports(record_type.canonical()) {
            return Err(Error::UnsupportedRecordType(record_type.label()));
        }
        self.append(name, data)
    }

    fn finish(&mut self) -> Result<()> {
        let builder = self
            .builder
            .take()
            .ok_or_else(|| Error::Other("TAR writer already finished".to_string()))?;
        // into_inner writes the end-of-archive marker
        let mut file = builder.into_inner().map_err(classify_io)?;
        use std::io::Write;
        file.flush().map_err(classify_io)
    }
}

/// Forward-only reader for TAR archives
pub struct TarArchiveReader {
    path: PathBuf,
}

impl TarArchiveReader {
    /// Open an existing TAR archive
    pub fn open(path: &Path) -> Result<Self> {
        // Fail early on missing/unreadable files; entries are read per pass
        File::open(path).map_err(classify_io)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl ArchiveReader for TarArchiveReader {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Tar
    }

    fn for_each_entity(
        &mut self,
        visit: &mut dyn FnMut(ReaderEntity) -> Result<EntityFlow>,
    ) -> Result<()> {
        let file = File::open(&self.path).map_err(classify_io)?;
        let mut archive = Archive::new(file);

        let entries = archive.entries().map_err(|e| Error::InvalidArchive {
            reason: format!("not a readable TAR archive: {e}"),
        })?;

        for entry in entries {
            let mut entry = entry.map_err(|e| Error::InvalidArchive {
                reason: format!("corrupt TAR entry: {e}"),
            })?;

            let name = entry
                .path()
                .map_err(|e| Error::InvalidArchive {
                    reason: format!("entry has no decodable name: {e}"),
                })?
                .to_string_lossy()
                .into_owned();

            let Some(record_type) = RecordType::from_entry_name(&name) else {
                tracing::debug!("skipping unrecognized entry: {name}");
                // Drain so the cursor advances past this entry
                std::io::copy(&mut entry, &mut std::io::sink())?;
                continue;
            };

            let last_modified = entry
                .header()
                .mtime()
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0));

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;

            let flow = visit(ReaderEntity {
                name,
                record_type,
                last_modified,
                data,
            })?;
            if flow == EntityFlow::Stop {
                return Ok(());
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
    fn test_write_then_read_entities_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");

        let books = vec![Book::new("Dune"), Book::new("Hyperion")];
        let meta = ArchiveMetaData::new().with_counts(books.len(), 0);

        let mut writer = TarArchiveWriter::create(&path).unwrap();
        writer.put_metadata(&meta).unwrap();
        assert_eq!(writer.put_books(&books).unwrap(), 2);
        writer
            .put_file(RecordType::Cover, "covers/abc.jpg", &[0xFF, 0xD8])
            .unwrap();
        writer.finish().unwrap();

        let mut reader = TarArchiveReader::open(&path).unwrap();
        let mut seen = Vec::new();
        reader
            .for_each_entity(&mut |entity| {
                seen.push((entity.name.clone(), entity.record_type));
                Ok(EntityFlow::Continue)
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("INFO.json".to_string(), RecordType::MetaData),
                ("books.csv".to_string(), RecordType::Books),
                ("covers/abc.jpg".to_string(), RecordType::Cover),
            ]
        );
        assert!(reader.is_valid());
    }

    #[test]
    fn test_first_entity_is_metadata_and_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");

        let mut writer = TarArchiveWriter::create(&path).unwrap();
        writer.put_metadata(&ArchiveMetaData::new()).unwrap();
        writer.put_books(&[Book::new("Dune")]).unwrap();
        writer.finish().unwrap();

        let mut reader = TarArchiveReader::open(&path).unwrap();
        // Two passes yield the same first entity; nothing is consumed
        for _ in 0..2 {
            let first = first_entity(&mut reader).unwrap().unwrap();
            assert_eq!(first.record_type, RecordType::MetaData);
            assert!(ArchiveMetaData::from_entry(&first.name, &first.data).is_ok());
        }
    }

    #[test]
    fn test_xml_data_entry_is_recognized_as_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");

        let mut writer = TarArchiveWriter::create(&path).unwrap();
        writer.put_metadata(&ArchiveMetaData::new()).unwrap();
        writer
            .put_xml_data("preferences.xml", b"<preferences/>")
            .unwrap();
        writer.finish().unwrap();

        let mut reader = TarArchiveReader::open(&path).unwrap();
        let mut legacy = None;
        reader
            .for_each_entity(&mut |entity| {
                if entity.record_type.is_legacy() {
                    legacy = Some(entity);
                }
                Ok(EntityFlow::Continue)
            })
            .unwrap();

        let legacy = legacy.unwrap();
        assert_eq!(legacy.record_type, RecordType::PreferencesPreV2);
        assert_eq!(legacy.data, b"<preferences/>");
    }

    #[test]
    fn test_xml_data_requires_known_entry_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");

        let mut writer = TarArchiveWriter::create(&path).unwrap();
        assert!(writer.put_xml_data("README.txt", b"<x/>").is_err());
        assert!(writer.put_xml_data("styles.xml", b"<styles/>").is_ok());
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(TarArchiveReader::open(Path::new("/nonexistent/x.tar")).is_err());
    }

    #[test]
    fn test_garbage_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.tar");
        std::fs::write(&path, b"this is not a tar archive at all").unwrap();

        let mut reader = TarArchiveReader::open(&path).unwrap();
        assert!(!reader.is_valid());
    }

    #[test]
    fn test_second_books_batch_gets_numbered_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");

        let mut writer = TarArchiveWriter::create(&path).unwrap();
        writer.put_metadata(&ArchiveMetaData::new()).unwrap();
        writer.put_books(&[Book::new("A")]).unwrap();
        writer.put_books(&[Book::new("B")]).unwrap();
        writer.finish().unwrap();

        let mut reader = TarArchiveReader::open(&path).unwrap();
        let mut names = Vec::new();
        reader
            .for_each_entity(&mut |entity| {
                names.push(entity.name.clone());
                Ok(EntityFlow::Continue)
            })
            .unwrap();
        assert_eq!(names, vec!["INFO.json", "books.csv", "books_2.csv"]);
    }
}
