//! Export pipeline: catalogue out to an archive
//!
//! One `ExportHelper` per operation. The helper drives a single sequential
//! write: metadata first, then each selected record type in a fixed order.
//! Cancellation is polled per book; a cancelled export still closes the
//! container so the partial file is structurally finished, and reports
//! `cancelled` in its results.

use crate::archive::{self, names, ArchiveMetaData, ArchiveWriter, ContainerFormat};
use crate::error::{classify_io, Result};
use crate::model::Book;
use crate::progress::ProgressListener;
use crate::record::{RecordType, RecordTypeSelection};
use crate::results::ExportResults;
use crate::store::Catalogue;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Cover image extensions recognized in the covers directory
const COVER_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Default directory for new backup archives
pub fn default_backup_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("BookVault")
}

/// Configures and runs one export operation
pub struct ExportHelper {
    destination: PathBuf,
    format: ContainerFormat,
    selection: RecordTypeSelection,
    date_from: Option<DateTime<Utc>>,
    covers_dir: Option<PathBuf>,
    database_snapshot: Option<PathBuf>,
}

impl ExportHelper {
    /// Export everything to `destination` in the given format
    pub fn new(destination: impl Into<PathBuf>, format: ContainerFormat) -> Self {
        Self {
            destination: destination.into(),
            format,
            selection: RecordTypeSelection::all(),
            date_from: None,
            covers_dir: None,
            database_snapshot: None,
        }
    }

    /// Restrict the export to the given record types
    pub fn with_selection(mut self, selection: RecordTypeSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Incremental export: only books modified strictly after this instant
    pub fn with_date_from(mut self, since: DateTime<Utc>) -> Self {
        self.date_from = Some(since);
        self
    }

    /// Directory holding cover images, named `<book uuid>.<ext>`
    pub fn with_covers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.covers_dir = Some(dir.into());
        self
    }

    /// Database file to embed as an opaque snapshot entry
    pub fn with_database_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_snapshot = Some(path.into());
        self
    }

    /// The archive path this helper writes to
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Run the export
    pub fn write(
        &self,
        catalogue: &dyn Catalogue,
        listener: &dyn ProgressListener,
    ) -> Result<ExportResults> {
        info!(
            destination = %self.destination.display(),
            format = %self.format,
            "starting export"
        );

        let books = self.gather_books(catalogue)?;
        let covers = self.gather_covers(&books);

        let mut writer = archive::create_writer(&self.destination, self.format)?;
        let mut results = ExportResults::default();

        let meta = self.build_metadata(&books, &covers, writer.as_ref());
        writer.put_metadata(&meta)?;

        listener.set_max(books.len() + covers.len());

        if self.selection.contains(RecordType::Books) && writer.supports(RecordType::Books) {
            let mut batch = Vec::with_capacity(books.len());
            for book in &books {
                if listener.is_cancelled() {
                    results.cancelled = true;
                    break;
                }
                listener.on_progress_step(1, &book.title);
                batch.push(book.clone());
            }
            if !batch.is_empty() {
                writer.put_books(&batch)?;
            }
            for book in &batch {
                results.add_book(&book.uuid);
            }
        }

        if !results.cancelled {
            let cancelled = self.write_covers(writer.as_mut(), &covers, listener, &mut results)?;
            results.cancelled = cancelled;
        }

        if !results.cancelled {
            if self.selection.contains(RecordType::Styles) && writer.supports(RecordType::Styles) {
                let styles = catalogue.all_styles()?;
                if !styles.is_empty() {
                    results.style_count = writer.put_styles(&styles)?;
                }
            }

            if self.selection.contains(RecordType::Preferences)
                && writer.supports(RecordType::Preferences)
            {
                let prefs = catalogue.preferences()?;
                if !prefs.is_empty() {
                    writer.put_preferences(&prefs)?;
                    results.has_preferences = true;
                }
            }

            if self.selection.contains(RecordType::Database)
                && writer.supports(RecordType::Database)
            {
                if let Some(db) = &self.database_snapshot {
                    let data = std::fs::read(db).map_err(classify_io)?;
                    writer.put_file(RecordType::Database, names::SNAPSHOT_DB, &data)?;
                    results.has_database = true;
                }
            }
        }

        writer.finish()?;

        info!(
            books = results.book_count,
            covers = results.cover_count,
            styles = results.style_count,
            cancelled = results.cancelled,
            "export finished"
        );
        Ok(results)
    }

    fn gather_books(&self, catalogue: &dyn Catalogue) -> Result<Vec<Book>> {
        if !self.selection.contains(RecordType::Books) {
            return Ok(Vec::new());
        }
        match self.date_from {
            Some(since) => catalogue.books_modified_since(since),
            None => catalogue.all_books(),
        }
    }

    /// Cover files for the books being exported, in book order
    fn gather_covers(&self, books: &[Book]) -> Vec<PathBuf> {
        if !self.selection.contains(RecordType::Cover) {
            return Vec::new();
        }
        let Some(dir) = &self.covers_dir else {
            return Vec::new();
        };
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "covers directory does not exist");
            return Vec::new();
        }

        // Index the directory once; cover files are named `<uuid>.<ext>`
        let mut by_uuid = std::collections::BTreeMap::new();
        for entry in walkdir::WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let has_cover_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| COVER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !has_cover_ext {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                by_uuid
                    .entry(stem.to_string())
                    .or_insert_with(|| path.to_path_buf());
            }
        }

        books
            .iter()
            .filter_map(|book| by_uuid.get(&book.uuid).cloned())
            .collect()
    }

    fn build_metadata(
        &self,
        books: &[Book],
        covers: &[PathBuf],
        writer: &dyn ArchiveWriter,
    ) -> ArchiveMetaData {
        let mut meta = ArchiveMetaData::new().with_counts(books.len(), covers.len());
        meta.has_styles =
            self.selection.contains(RecordType::Styles) && writer.supports(RecordType::Styles);
        meta.has_preferences = self.selection.contains(RecordType::Preferences)
            && writer.supports(RecordType::Preferences);
        meta.has_database = self.database_snapshot.is_some()
            && self.selection.contains(RecordType::Database)
            && writer.supports(RecordType::Database);
        meta
    }

    /// Returns true if cancelled mid-way
    fn write_covers(
        &self,
        writer: &mut dyn ArchiveWriter,
        covers: &[PathBuf],
        listener: &dyn ProgressListener,
        results: &mut ExportResults,
    ) -> Result<bool> {
        if covers.is_empty() || !writer.supports(RecordType::Cover) {
            return Ok(false);
        }
        for path in covers {
            if listener.is_cancelled() {
                return Ok(true);
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let data = match std::fs::read(path) {
                Ok(data) => data,
                Err(err) => {
                    // A vanished or unreadable cover degrades to a warning
                    warn!(path = %path.display(), %err, "skipping unreadable cover");
                    continue;
                }
            };
            let entry_name = format!("{}{file_name}", names::COVERS_PREFIX);
            writer.put_file(RecordType::Cover, &entry_name, &data)?;
            results.cover_count += 1;
            listener.on_progress_step(1, file_name);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CallbackListener, NullListener};
    use crate::store::MemoryCatalogue;
    use chrono::Duration;
    use std::sync::atomic::Ordering;

    fn catalogue_with_books(n: usize) -> MemoryCatalogue {
        let mut catalogue = MemoryCatalogue::new();
        for i in 0..n {
            catalogue.put_book(Book::new(format!("Book {i}")));
        }
        catalogue
    }

    #[test]
    fn test_full_export_to_tar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");
        let mut catalogue = catalogue_with_books(3);
        catalogue.preferences_mut().set("sort", "author");

        let results = ExportHelper::new(&path, ContainerFormat::Tar)
            .write(&catalogue, &NullListener)
            .unwrap();

        assert_eq!(results.book_count, 3);
        assert_eq!(results.exported_uuids.len(), 3);
        assert!(results.has_preferences);
        assert!(results.is_complete());
        assert!(path.is_file());
    }

    #[test]
    fn test_incremental_export_filters_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");

        let mut catalogue = MemoryCatalogue::new();
        let old = Book::new("Old");
        let cutoff = old.last_modified + Duration::seconds(10);
        let mut new = Book::new("New");
        new.last_modified = cutoff + Duration::seconds(10);
        catalogue.put_book(old);
        catalogue.put_book(new.clone());

        let results = ExportHelper::new(&path, ContainerFormat::Tar)
            .with_date_from(cutoff)
            .write(&catalogue, &NullListener)
            .unwrap();

        assert_eq!(results.book_count, 1);
        assert_eq!(results.exported_uuids, vec![new.uuid]);
    }

    #[test]
    fn test_export_covers_for_exported_books_only() {
        let dir = tempfile::tempdir().unwrap();
        let covers = dir.path().join("covers");
        std::fs::create_dir(&covers).unwrap();

        let mut catalogue = MemoryCatalogue::new();
        let book = Book::new("Dune");
        std::fs::write(covers.join(format!("{}.jpg", book.uuid)), b"jpeg").unwrap();
        std::fs::write(covers.join("unrelated.jpg"), b"jpeg").unwrap();
        catalogue.put_book(book);

        let path = dir.path().join("backup.tar");
        let results = ExportHelper::new(&path, ContainerFormat::Tar)
            .with_covers_dir(&covers)
            .write(&catalogue, &NullListener)
            .unwrap();

        assert_eq!(results.cover_count, 1);
    }

    #[test]
    fn test_books_only_selection_skips_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");
        let mut catalogue = catalogue_with_books(1);
        catalogue.preferences_mut().set("sort", "author");

        let results = ExportHelper::new(&path, ContainerFormat::Tar)
            .with_selection(RecordTypeSelection::books_only())
            .write(&catalogue, &NullListener)
            .unwrap();

        assert_eq!(results.book_count, 1);
        assert!(!results.has_preferences);
        assert_eq!(results.style_count, 0);
    }

    #[test]
    fn test_cancellation_before_start_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar");
        let catalogue = catalogue_with_books(5);

        let listener = CallbackListener::new(|_, _, _| {});
        listener.cancel_flag().store(true, Ordering::SeqCst);

        let results = ExportHelper::new(&path, ContainerFormat::Tar)
            .write(&catalogue, &listener)
            .unwrap();

        assert!(results.cancelled);
        assert_eq!(results.book_count, 0);
        // The container is still closed
        assert!(path.is_file());
    }

    #[test]
    fn test_xml_export_carries_books_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xml");
        let mut catalogue = catalogue_with_books(2);
        catalogue.preferences_mut().set("sort", "author");

        let results = ExportHelper::new(&path, ContainerFormat::Xml)
            .write(&catalogue, &NullListener)
            .unwrap();

        assert_eq!(results.book_count, 2);
        assert!(!results.has_preferences);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<NeverTooManyBooks version=\"2\">"));
    }
}
