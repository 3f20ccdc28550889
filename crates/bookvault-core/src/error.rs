//! Error types for bookvault-core

use thiserror::Error;

/// Main error type for catalogue backup/restore operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is structurally unreadable. Nothing imported from it can
    /// be trusted.
    #[error("Invalid archive: {reason}")]
    InvalidArchive { reason: String },

    /// The archive declares a version outside the range this build can read.
    #[error("Unsupported archive version {found} (this build reads {minimum}..={maximum})")]
    UnsupportedVersion {
        found: u32,
        minimum: u32,
        maximum: u32,
    },

    /// Import failed for a structural reason (missing metadata, container
    /// mismatch). Per-record decode failures never raise this; they degrade
    /// to counters instead.
    #[error("Import failed: {0}")]
    Import(String),

    /// The record type is not carried by this container format.
    #[error("Record type {0} is not supported by this container")]
    UnsupportedRecordType(&'static str),

    #[error("Storage is full")]
    StorageFull,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for bookvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// ENOSPC on the platforms we care about
const ENOSPC: i32 = 28;

/// Classify an I/O error into the caller-facing taxonomy.
///
/// Disk-full and permission failures get their own variants so callers can
/// show a targeted message instead of a generic I/O failure.
pub(crate) fn classify_io(err: std::io::Error) -> Error {
    if err.raw_os_error() == Some(ENOSPC) {
        return Error::StorageFull;
    }
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => Error::AccessDenied(err.to_string()),
        _ => Error::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission_denied() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        match classify_io(io) {
            Error::AccessDenied(_) => {}
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_disk_full() {
        let io = std::io::Error::from_raw_os_error(ENOSPC);
        match classify_io(io) {
            Error::StorageFull => {}
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_version_message() {
        let err = Error::UnsupportedVersion {
            found: 0,
            minimum: 1,
            maximum: 2,
        };
        assert!(err.to_string().contains("version 0"));
    }
}
