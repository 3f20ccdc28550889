//! # bookvault-core
//!
//! Core library for backing up and restoring a book catalogue.
//!
//! This crate provides the foundational functionality for:
//! - Writing backup archives in TAR, JSON, and (export-only) XML containers
//! - Reading archives back with a versioned, forward-compatible header
//! - Full and incremental ("since last backup") book export
//! - Import with per-record conflict resolution (skip, overwrite, newer)
//! - Cover images, booklist styles, and preference records alongside books
//! - Progress reporting and cooperative cancellation for long operations
//!
//! ## Modules
//!
//! - [`archive`] - Container formats, readers, writers, and the metadata header
//! - [`codec`] - Record encodings (CSV and JSON books, JSON styles/preferences)
//! - [`error`] - Error types and Result alias
//! - [`export`] - Export pipeline
//! - [`import`] - Import pipeline
//! - [`model`] - Domain records (books, styles, preferences)
//! - [`progress`] - Progress listeners and cancellation
//! - [`record`] - Record types and selection sets
//! - [`resolve`] - Import conflict policies
//! - [`results`] - Export/import result accumulators
//! - [`store`] - Data-access traits and the in-memory catalogue
//!
//! ## Example
//!
//! ```no_run
//! use bookvault_core::{
//!     Book, ContainerFormat, ExportHelper, ImportHelper, MemoryCatalogue, NullListener, Updates,
//! };
//!
//! # fn main() -> bookvault_core::Result<()> {
//! let mut catalogue = MemoryCatalogue::new();
//! catalogue.put_book(Book::new("Dune").with_author("Frank Herbert"));
//!
//! // Back everything up
//! let exported = ExportHelper::new("backup.tar", ContainerFormat::Tar)
//!     .write(&catalogue, &NullListener)?;
//! println!("exported {} books", exported.book_count);
//!
//! // Restore, leaving existing records untouched
//! let imported = ImportHelper::new("backup.tar", ContainerFormat::Tar)
//!     .with_updates(Updates::Skip)
//!     .read(&mut catalogue, &NullListener)?;
//! println!("created {}, skipped {}", imported.books_created, imported.books_skipped);
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod archive;
pub mod codec;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod progress;
pub mod record;
pub mod resolve;
pub mod results;
pub mod store;

// Re-export key types for convenience

// Error types
pub use error::{Error, Result};

// Domain records
pub use model::{AppPreferences, Book, BooklistStyle};

// Archive containers
pub use archive::{
    ArchiveMetaData, ArchiveReader, ArchiveWriter, ContainerFormat, EntityFlow, ReaderEntity,
    ARCHIVE_VERSION, CAN_READ_VERSION,
};

// Record types and selection
pub use record::{RecordType, RecordTypeSelection};

// Pipelines
pub use export::{default_backup_dir, ExportHelper};
pub use import::ImportHelper;

// Conflict resolution
pub use resolve::{decide, ImportDecision, Updates};

// Results
pub use results::{ExportResults, ImportResults};

// Progress and cancellation
pub use progress::{CallbackListener, NullListener, ProgressListener};

// Storage traits
pub use store::{BookStore, Catalogue, MemoryCatalogue, PreferenceStore, StyleStore};
