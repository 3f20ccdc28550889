//! Archive container abstraction
//!
//! A container is the physical encapsulation of an archive: a sequence of
//! named, typed entries. Containers support sequential write (append-only,
//! caller-ordered) and forward-only sequential read; streaming formats like
//! TAR forbid random access, so there is no seek anywhere in this contract.
//!
//! Failure semantics on write: any error from a `put_*` call or `finish`
//! leaves a partially written, invalid archive. No rollback is attempted;
//! the caller must discard the output file.

mod json;
pub mod metadata;
mod tar;
mod xml;

pub use json::{JsonArchiveReader, JsonArchiveWriter};
pub use metadata::{ArchiveMetaData, ARCHIVE_VERSION, CAN_READ_VERSION};
pub use tar::{TarArchiveReader, TarArchiveWriter};
pub use xml::XmlArchiveWriter;

use crate::error::{Error, Result};
use crate::model::{AppPreferences, Book, BooklistStyle};
use crate::record::RecordType;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Well-known entry names
pub mod names {
    pub const INFO_JSON: &str = "INFO.json";
    pub const INFO_XML: &str = "INFO.xml";
    pub const BOOKS_CSV: &str = "books.csv";
    pub const BOOKS_JSON: &str = "books.json";
    pub const STYLES_JSON: &str = "styles.json";
    pub const PREFERENCES_JSON: &str = "preferences.json";
    pub const SNAPSHOT_DB: &str = "snapshot.db";
    pub const COVERS_PREFIX: &str = "covers/";
}

/// The physical container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormat {
    /// TAR file with one entry per record batch; read and write
    #[default]
    Tar,
    /// Single JSON document; read and write
    Json,
    /// Streaming XML envelope; write only
    Xml,
}

impl ContainerFormat {
    /// Default file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Tar => "tar",
            ContainerFormat::Json => "json",
            ContainerFormat::Xml => "xml",
        }
    }

    /// Whether archives of this format can be read back
    pub fn can_read(&self) -> bool {
        !matches!(self, ContainerFormat::Xml)
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFormat::Tar => write!(f, "TAR"),
            ContainerFormat::Json => write!(f, "JSON"),
            ContainerFormat::Xml => write!(f, "XML"),
        }
    }
}

/// One physical entry yielded by a container reader
///
/// The payload is fully drained from the container before the entity is
/// handed out, so the read cursor is always positioned at the next entry.
#[derive(Debug, Clone)]
pub struct ReaderEntity {
    /// Original entry name inside the container
    pub name: String,
    pub record_type: RecordType,
    /// Entry modification time, when the container records one
    pub last_modified: Option<DateTime<Utc>>,
    pub data: Vec<u8>,
}

/// Flow control for entity visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFlow {
    Continue,
    Stop,
}

/// Sequential archive writer
///
/// Calls are append-only and ordered by the caller. `supports` reports which
/// record types this container can physically carry; callers should consult
/// it and no-op unsupported types, since `put_*` for an unsupported type is
/// an error, never silent data loss.
pub trait ArchiveWriter {
    /// The format this writer produces
    fn format(&self) -> ContainerFormat;

    /// Whether this container can carry the given record type
    fn supports(&self, record_type: RecordType) -> bool;

    /// Write the archive header. Must be called before any data entries;
    /// formats whose envelope puts metadata last (XML) defer it internally.
    fn put_metadata(&mut self, meta: &ArchiveMetaData) -> Result<()>;

    /// Write a batch of book records; returns the number written
    fn put_books(&mut self, books: &[Book]) -> Result<usize>;

    /// Write the booklist styles; returns the number written
    fn put_styles(&mut self, styles: &[BooklistStyle]) -> Result<usize>;

    /// Write the application preferences
    fn put_preferences(&mut self, prefs: &AppPreferences) -> Result<()>;

    /// Write an opaque file entry (cover image, database snapshot)
    fn put_file(&mut self, record_type: RecordType, name: &str, data: &[u8]) -> Result<()>;

    /// Write a raw XML blob under the given entry name (legacy side data)
    fn put_xml_data(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Finalize the container (end-of-archive markers, deferred blocks,
    /// flush). The archive is not valid until this returns Ok.
    fn finish(&mut self) -> Result<()>;
}

/// Forward-only archive reader
pub trait ArchiveReader {
    /// The format this reader consumes
    fn format(&self) -> ContainerFormat;

    /// Visit entities in container order until the visitor returns `Stop`
    /// or entries run out. Each call starts a fresh pass from the first
    /// entry, so `read_meta_data` never consumes anything a later full
    /// read needs.
    fn for_each_entity(
        &mut self,
        visit: &mut dyn FnMut(ReaderEntity) -> Result<EntityFlow>,
    ) -> Result<()>;

    /// Cheap structural sanity check: the first entity decodes as metadata.
    /// Not exhaustive; a full read can still fail.
    fn is_valid(&mut self) -> bool {
        first_entity(self)
            .ok()
            .flatten()
            .filter(|e| e.record_type == RecordType::MetaData)
            .map(|e| ArchiveMetaData::from_entry(&e.name, &e.data).is_ok())
            .unwrap_or(false)
    }
}

/// Read only the first entity of an archive
pub fn first_entity<R: ArchiveReader + ?Sized>(reader: &mut R) -> Result<Option<ReaderEntity>> {
    let mut first = None;
    reader.for_each_entity(&mut |entity| {
        first = Some(entity);
        Ok(EntityFlow::Stop)
    })?;
    Ok(first)
}

/// Save an entity's payload as a file under `dir`, using the entry's base
/// name. Used for cover images during import.
pub fn save_entity_to_dir(entity: &ReaderEntity, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let base = entity
        .name
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::InvalidArchive {
            reason: format!("entry has no usable file name: {}", entity.name),
        })?;
    let path = dir.join(base);
    std::fs::write(&path, &entity.data)?;
    Ok(path)
}

/// Create a writer for the given destination and format
pub fn create_writer(path: &Path, format: ContainerFormat) -> Result<Box<dyn ArchiveWriter>> {
    match format {
        ContainerFormat::Tar => Ok(Box::new(TarArchiveWriter::create(path)?)),
        ContainerFormat::Json => Ok(Box::new(JsonArchiveWriter::create(path)?)),
        ContainerFormat::Xml => Ok(Box::new(XmlArchiveWriter::create(path)?)),
    }
}

/// Create a reader for the given source and format
pub fn create_reader(path: &Path, format: ContainerFormat) -> Result<Box<dyn ArchiveReader>> {
    match format {
        ContainerFormat::Tar => Ok(Box::new(TarArchiveReader::open(path)?)),
        ContainerFormat::Json => Ok(Box::new(JsonArchiveReader::open(path)?)),
        ContainerFormat::Xml => Err(Error::InvalidArchive {
            reason: "XML archives are export-only and cannot be read".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_capabilities() {
        assert!(ContainerFormat::Tar.can_read());
        assert!(ContainerFormat::Json.can_read());
        assert!(!ContainerFormat::Xml.can_read());
        assert_eq!(ContainerFormat::Tar.extension(), "tar");
    }

    #[test]
    fn test_xml_reader_is_refused() {
        let err = create_reader(Path::new("/tmp/whatever.xml"), ContainerFormat::Xml);
        assert!(err.is_err());
    }

    #[test]
    fn test_save_entity_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let entity = ReaderEntity {
            name: "covers/abc.jpg".to_string(),
            record_type: RecordType::Cover,
            last_modified: None,
            data: vec![1, 2, 3],
        };
        let path = save_entity_to_dir(&entity, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "abc.jpg");
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
