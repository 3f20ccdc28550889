//! Import conflict resolution
//!
//! For every decoded book the importer resolves identity by UUID and asks
//! `decide` what to do. New records (no local UUID match) are always
//! imported; the update policy only governs collisions with existing
//! records.

use crate::model::Book;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy for existing-record collisions during import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Updates {
    /// Leave existing records untouched ("new books only")
    #[default]
    Skip,
    /// Replace existing records with the imported fields ("all books")
    Overwrite,
    /// Replace only when the imported record is strictly newer
    OnlyNewer,
}

impl Updates {
    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Updates::Skip => "New books only",
            Updates::Overwrite => "All books",
            Updates::OnlyNewer => "Newer books",
        }
    }
}

impl fmt::Display for Updates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Decision for a single imported book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDecision {
    /// No local record with this UUID; insert
    Create,
    /// Replace the local record
    Update,
    /// Leave the local record untouched
    Skip,
}

/// Decide what to do with one imported book.
///
/// `existing` is the local record found by UUID lookup, if any. The decision
/// is deterministic: identical inputs always produce identical outcomes.
pub fn decide(policy: Updates, existing: Option<&Book>, incoming: &Book) -> ImportDecision {
    let Some(existing) = existing else {
        // New records are always imported regardless of policy
        return ImportDecision::Create;
    };

    match policy {
        Updates::Skip => ImportDecision::Skip,
        Updates::Overwrite => ImportDecision::Update,
        Updates::OnlyNewer => {
            if incoming.last_modified > existing.last_modified {
                ImportDecision::Update
            } else {
                ImportDecision::Skip
            }
        }
    }
}
