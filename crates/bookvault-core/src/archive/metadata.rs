//! The versioned archive metadata envelope
//!
//! Metadata is constructed once per write, before any data entries are
//! emitted, and is the first entry decoded on read. Callers can inspect it
//! via `ImportHelper::read_meta_data` to validate compatibility or preview
//! contents without committing to a full import.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Archive format version written by this build
pub const ARCHIVE_VERSION: u32 = 2;

/// Oldest archive format version this build still reads
pub const CAN_READ_VERSION: u32 = 1;

/// The archive header record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetaData {
    /// Archive format version, monotonically increasing across releases
    pub version: u32,
    /// When the archive was written
    pub created: DateTime<Utc>,
    /// Number of book records, if known at write time
    #[serde(default)]
    pub book_count: Option<usize>,
    /// Number of cover entries, if known at write time
    #[serde(default)]
    pub cover_count: Option<usize>,
    #[serde(default)]
    pub has_styles: bool,
    #[serde(default)]
    pub has_preferences: bool,
    #[serde(default)]
    pub has_database: bool,
    /// Version of the application that wrote the archive
    #[serde(default)]
    pub writer_version: Option<String>,
}

impl ArchiveMetaData {
    /// Create metadata for a new archive at the current format version
    pub fn new() -> Self {
        Self {
            version: ARCHIVE_VERSION,
            created: Utc::now(),
            book_count: None,
            cover_count: None,
            has_styles: false,
            has_preferences: false,
            has_database: false,
            writer_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    /// Set the summary counts, builder-style
    pub fn with_counts(mut self, books: usize, covers: usize) -> Self {
        self.book_count = Some(books);
        self.cover_count = Some(covers);
        self
    }

    /// Whether this archive's version is readable by this build
    pub fn is_readable(&self) -> bool {
        (CAN_READ_VERSION..=ARCHIVE_VERSION).contains(&self.version)
    }

    /// Raise `UnsupportedVersion` if the declared version is outside the
    /// readable range.
    pub fn check_version(&self) -> Result<()> {
        if self.is_readable() {
            Ok(())
        } else {
            Err(Error::UnsupportedVersion {
                found: self.version,
                minimum: CAN_READ_VERSION,
                maximum: ARCHIVE_VERSION,
            })
        }
    }

    /// Serialize to pretty JSON bytes for inclusion in an archive
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode from v2+ JSON bytes
    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| Error::InvalidArchive {
            reason: format!("metadata does not decode: {e}"),
        })
    }

    /// Decode a v1 flat `INFO.xml` header.
    ///
    /// The legacy format is a flat list of
    /// `<item name="..." type="...">value</item>` lines. A full XML parser
    /// is not warranted for this; a forgiving scan for the known item names
    /// is enough, and unknown or missing items fall back to defaults.
    pub fn from_legacy_xml(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|_| Error::InvalidArchive {
            reason: "legacy metadata is not valid UTF-8".to_string(),
        })?;

        let version = legacy_item(text, "ArchVersion")
            .and_then(|v| v.parse::<u32>().ok())
            .ok_or_else(|| Error::InvalidArchive {
                reason: "legacy metadata has no ArchVersion item".to_string(),
            })?;

        let book_count = legacy_item(text, "NumBooks").and_then(|v| v.parse::<usize>().ok());
        let cover_count = legacy_item(text, "NumCovers").and_then(|v| v.parse::<usize>().ok());
        let created = legacy_item(text, "CreateDate")
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH);

        Ok(Self {
            version,
            created,
            book_count,
            cover_count,
            has_styles: false,
            has_preferences: false,
            has_database: false,
            writer_version: None,
        })
    }

    /// Decode metadata from an entry, dispatching on its name
    pub fn from_entry(name: &str, data: &[u8]) -> Result<Self> {
        if name.to_ascii_lowercase().ends_with(".xml") {
            Self::from_legacy_xml(data)
        } else {
            Self::from_json_slice(data)
        }
    }
}

impl Default for ArchiveMetaData {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the text of `<item name="NAME" ...>value</item>` from a flat
/// legacy XML document.
fn legacy_item<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("name=\"{name}\"");
    let item_start = text.find(&marker)?;
    let rest = &text[item_start..];
    let value_start = rest.find('>')? + 1;
    let value_end = rest[value_start..].find("</item>")?;
    Some(rest[value_start..value_start + value_end].trim())
}
