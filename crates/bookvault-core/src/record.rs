//! Record types carried by an archive, and the selection set callers use
//! to choose what gets exported or imported

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The closed set of record kinds an archive can carry
///
/// The `*PreV2` variants exist only so version-1 archives remain
/// recognizable on read; they are never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// The archive header. Always present, always first on write.
    MetaData,
    Books,
    /// A cover image file for one book
    Cover,
    Preferences,
    Styles,
    /// Raw database snapshot (legacy, carried as an opaque file)
    Database,
    /// v1 flat-XML preferences (read recognition only)
    PreferencesPreV2,
    /// v1 serialized styles (read recognition only)
    StylesPreV2,
}

impl RecordType {
    /// Map legacy variants to their current counterpart.
    ///
    /// Applied at read time only; writers never emit legacy types.
    pub fn canonical(self) -> Self {
        match self {
            RecordType::PreferencesPreV2 => RecordType::Preferences,
            RecordType::StylesPreV2 => RecordType::Styles,
            other => other,
        }
    }

    /// True for the read-compatibility variants
    pub fn is_legacy(self) -> bool {
        matches!(
            self,
            RecordType::PreferencesPreV2 | RecordType::StylesPreV2
        )
    }

    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::MetaData => "Archive metadata",
            RecordType::Books => "Books",
            RecordType::Cover => "Cover images",
            RecordType::Preferences => "Preferences",
            RecordType::Styles => "Booklist styles",
            RecordType::Database => "Database snapshot",
            RecordType::PreferencesPreV2 => "Preferences (pre-v2)",
            RecordType::StylesPreV2 => "Booklist styles (pre-v2)",
        }
    }

    /// Infer the record type of an archive entry from its name.
    ///
    /// This is the compatibility table: entry names are a convention shared
    /// across archive versions, so a single match covers both current and
    /// legacy layouts. Unknown names return `None` and the entry is skipped.
    pub fn from_entry_name(name: &str) -> Option<Self> {
        let name = name.trim_start_matches("./");
        let lower = name.to_ascii_lowercase();

        if lower == "info.json" || lower == "info.xml" {
            return Some(RecordType::MetaData);
        }
        if lower.starts_with("books") && lower.ends_with(".csv") {
            return Some(RecordType::Books);
        }
        if lower.starts_with("books") && lower.ends_with(".json") {
            return Some(RecordType::Books);
        }
        // Legacy v1 XML export of the book list; recognized but not decodable
        if lower == "data.xml" {
            return Some(RecordType::Books);
        }
        if lower == "styles.json" {
            return Some(RecordType::Styles);
        }
        if lower == "preferences.json" {
            return Some(RecordType::Preferences);
        }
        if lower == "styles.xml" {
            return Some(RecordType::StylesPreV2);
        }
        if lower == "preferences.xml" {
            return Some(RecordType::PreferencesPreV2);
        }
        if lower == "snapshot.db" {
            return Some(RecordType::Database);
        }
        if lower.starts_with("covers/")
            || lower.ends_with(".jpg")
            || lower.ends_with(".jpeg")
            || lower.ends_with(".png")
        {
            return Some(RecordType::Cover);
        }
        None
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The set of record types a caller wants processed
///
/// Metadata is not part of the selection: it is always written first and
/// always decoded first, independent of what the caller selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTypeSelection {
    types: BTreeSet<RecordType>,
}

impl RecordTypeSelection {
    /// Empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything except the legacy database snapshot
    pub fn all() -> Self {
        Self::new()
            .with(RecordType::Books)
            .with(RecordType::Cover)
            .with(RecordType::Styles)
            .with(RecordType::Preferences)
    }

    /// Books only
    pub fn books_only() -> Self {
        Self::new().with(RecordType::Books)
    }

    /// Add a type, builder-style
    pub fn with(mut self, record_type: RecordType) -> Self {
        self.insert(record_type);
        self
    }

    /// Add a type
    pub fn insert(&mut self, record_type: RecordType) {
        self.types.insert(record_type.canonical());
    }

    /// Whether the (canonicalized) type is selected
    pub fn contains(&self, record_type: RecordType) -> bool {
        self.types.contains(&record_type.canonical())
    }

    /// Number of selected types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate the selected types in canonical order
    pub fn iter(&self) -> impl Iterator<Item = RecordType> + '_ {
        self.types.iter().copied()
    }
}
