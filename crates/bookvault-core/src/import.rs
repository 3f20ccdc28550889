//! Import pipeline: archive back into the catalogue
//!
//! One `ImportHelper` per operation. `read_meta_data` peeks at the header
//! without consuming anything; `read` walks the whole archive, dispatching
//! each entity by record type. Structural problems (no metadata, version
//! out of range) abort; individual record failures degrade to counters and
//! warnings so one bad row never poisons the rest of the archive.

use crate::archive::{self, first_entity, ArchiveMetaData, ContainerFormat, EntityFlow, ReaderEntity};
use crate::codec;
use crate::error::{Error, Result};
use crate::progress::ProgressListener;
use crate::record::{RecordType, RecordTypeSelection};
use crate::resolve::{decide, ImportDecision, Updates};
use crate::results::ImportResults;
use crate::store::Catalogue;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configures and runs one import operation
pub struct ImportHelper {
    source: PathBuf,
    format: ContainerFormat,
    selection: RecordTypeSelection,
    updates: Updates,
    covers_dir: Option<PathBuf>,
}

impl ImportHelper {
    /// Import everything from `source`, skipping existing books
    pub fn new(source: impl Into<PathBuf>, format: ContainerFormat) -> Self {
        Self {
            source: source.into(),
            format,
            selection: RecordTypeSelection::all(),
            updates: Updates::default(),
            covers_dir: None,
        }
    }

    /// Restrict the import to the given record types
    pub fn with_selection(mut self, selection: RecordTypeSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Policy for books whose UUID already exists locally
    pub fn with_updates(mut self, updates: Updates) -> Self {
        self.updates = updates;
        self
    }

    /// Directory to save imported cover images into
    pub fn with_covers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.covers_dir = Some(dir.into());
        self
    }

    /// The archive path this helper reads from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Decode the archive header without reading any data entries.
    ///
    /// Returns `Ok(None)` when the archive opens but its first entry is not
    /// metadata. Version compatibility is not enforced here; callers may
    /// want to show an incompatible archive's details before refusing it.
    pub fn read_meta_data(&self) -> Result<Option<ArchiveMetaData>> {
        let mut reader = archive::create_reader(&self.source, self.format)?;
        let Some(entity) = first_entity(reader.as_mut())? else {
            return Ok(None);
        };
        if entity.record_type != RecordType::MetaData {
            return Ok(None);
        }
        ArchiveMetaData::from_entry(&entity.name, &entity.data).map(Some)
    }

    /// Run the import
    pub fn read(
        &self,
        catalogue: &mut dyn Catalogue,
        listener: &dyn ProgressListener,
    ) -> Result<ImportResults> {
        info!(
            source = %self.source.display(),
            format = %self.format,
            policy = %self.updates,
            "starting import"
        );

        let meta = self
            .read_meta_data()?
            .ok_or_else(|| Error::InvalidArchive {
                reason: "archive has no metadata header".to_string(),
            })?;
        meta.check_version()?;

        if let Some(count) = meta.book_count {
            listener.set_max(count);
        }

        let mut reader = archive::create_reader(&self.source, self.format)?;
        let mut results = ImportResults::default();

        reader.for_each_entity(&mut |entity| {
            if listener.is_cancelled() {
                results.cancelled = true;
                return Ok(EntityFlow::Stop);
            }
            self.import_entity(&entity, catalogue, listener, &mut results)?;
            if results.cancelled {
                return Ok(EntityFlow::Stop);
            }
            Ok(EntityFlow::Continue)
        })?;

        info!(
            processed = results.books_processed,
            created = results.books_created,
            updated = results.books_updated,
            skipped = results.books_skipped,
            failed = results.books_failed,
            covers = results.cover_count,
            cancelled = results.cancelled,
            "import finished"
        );
        Ok(results)
    }

    fn import_entity(
        &self,
        entity: &ReaderEntity,
        catalogue: &mut dyn Catalogue,
        listener: &dyn ProgressListener,
        results: &mut ImportResults,
    ) -> Result<()> {
        let canonical = entity.record_type.canonical();
        if canonical != RecordType::MetaData && !self.selection.contains(canonical) {
            debug!(name = %entity.name, "entry not selected, skipping");
            return Ok(());
        }

        match canonical {
            RecordType::MetaData => Ok(()),
            RecordType::Books => self.import_books(entity, catalogue, listener, results),
            RecordType::Cover => self.import_cover(entity, results),
            RecordType::Styles => {
                if entity.record_type.is_legacy() {
                    warn!(name = %entity.name, "pre-v2 styles are not importable, skipping");
                    return Ok(());
                }
                // A broken styles payload never aborts an import that may
                // already have committed books
                let decoded = match codec::json::decode_styles(&entity.data) {
                    Ok(decoded) => decoded,
                    Err(err) => {
                        warn!(name = %entity.name, %err, "styles payload does not decode, skipping");
                        results.styles_failed += 1;
                        return Ok(());
                    }
                };
                results.styles_failed += decoded.failed;
                for style in &decoded.styles {
                    catalogue.upsert_style(style)?;
                }
                results.style_count += decoded.styles.len();
                Ok(())
            }
            RecordType::Preferences => {
                if entity.record_type.is_legacy() {
                    warn!(name = %entity.name, "pre-v2 preferences are not importable, skipping");
                    return Ok(());
                }
                let prefs = match codec::json::decode_preferences(&entity.data) {
                    Ok(prefs) => prefs,
                    Err(err) => {
                        warn!(name = %entity.name, %err, "preferences payload does not decode, skipping");
                        return Ok(());
                    }
                };
                catalogue.restore_preferences(&prefs)?;
                results.has_preferences = true;
                Ok(())
            }
            RecordType::Database => {
                // Snapshots are written for disaster recovery, never imported
                debug!(name = %entity.name, "database snapshot present, not imported");
                Ok(())
            }
            RecordType::PreferencesPreV2 | RecordType::StylesPreV2 => unreachable!(),
        }
    }

    fn import_books(
        &self,
        entity: &ReaderEntity,
        catalogue: &mut dyn Catalogue,
        listener: &dyn ProgressListener,
        results: &mut ImportResults,
    ) -> Result<()> {
        let lower = entity.name.to_ascii_lowercase();
        let decoded = if lower.ends_with(".csv") {
            codec::csv::decode_books(&entity.data)?
        } else if lower.ends_with(".json") {
            codec::json::decode_books(&entity.data)?
        } else {
            // v1 data.xml book lists have no reader
            warn!(name = %entity.name, "book entry in an unreadable encoding, skipping");
            return Ok(());
        };
        results.books_failed += decoded.failed;

        for book in &decoded.books {
            if listener.is_cancelled() {
                results.cancelled = true;
                return Ok(());
            }

            results.books_processed += 1;
            listener.on_progress_step(1, &book.title);

            let existing = catalogue.find_by_uuid(&book.uuid)?;
            match decide(self.updates, existing.as_ref(), book) {
                ImportDecision::Create => {
                    catalogue.insert_book(book)?;
                    results.books_created += 1;
                }
                ImportDecision::Update => {
                    catalogue.update_book(book)?;
                    results.books_updated += 1;
                }
                ImportDecision::Skip => {
                    results.books_skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn import_cover(&self, entity: &ReaderEntity, results: &mut ImportResults) -> Result<()> {
        let Some(dir) = &self.covers_dir else {
            debug!(name = %entity.name, "no covers directory configured, skipping cover");
            return Ok(());
        };
        match archive::save_entity_to_dir(entity, dir) {
            Ok(path) => {
                debug!(path = %path.display(), "cover saved");
                results.cover_count += 1;
            }
            Err(err) => {
                // One bad cover never fails the import
                warn!(name = %entity.name, %err, "failed to save cover");
            }
        }
        Ok(())
    }
}
