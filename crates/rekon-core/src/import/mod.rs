//! Import pipeline: preview classification and batch execution.
//!
//! [`ImportService::preview`] parses each discovered file and classifies it
//! against the inventory as new, duplicate (same path) or conflict (same
//! artist and title at another path). Conflicts get a decision attached,
//! by an operator or by [`apply_conflict_policy`], and the candidates are
//! then handed to [`ImportService::execute`].

mod classifier;
mod executor;
pub mod index;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::context::ReconcileContext;
use crate::fields::FieldDiff;
use crate::inventory::{ArtistDirectory, InventoryRecord, InventoryStore, RecordFilter, StoreError};
use crate::parser::{ParsedMetadata, TagSource};

pub use index::InventoryIndex;

/// Import error types
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to load inventory index: {0}")]
    Index(#[from] StoreError),
}

/// Outcome of duplicate/conflict detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// No match, safe to import
    #[default]
    New,
    /// Same path already in the inventory
    Duplicate,
    /// Same artist and title at a different path
    Conflict,
}

/// Resolution chosen for a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserDecision {
    Skip,
    /// Point the existing record at the new file
    Merge,
    /// Create an independent second record
    Import,
}

/// Batch-wide conflict resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Skip,
    Merge,
    Import,
}

impl ConflictPolicy {
    pub fn decision(self) -> UserDecision {
        match self {
            ConflictPolicy::Skip => UserDecision::Skip,
            ConflictPolicy::Merge => UserDecision::Merge,
            ConflictPolicy::Import => UserDecision::Import,
        }
    }
}

/// Set `policy` on every conflict that has no decision yet
pub fn apply_conflict_policy(candidates: &mut [ImportCandidate], policy: ConflictPolicy) -> usize {
    let mut applied = 0;
    for candidate in candidates
        .iter_mut()
        .filter(|c| c.status == ImportStatus::Conflict && c.user_decision.is_none())
    {
        candidate.user_decision = Some(policy.decision());
        applied += 1;
    }
    applied
}

/// A discovered file under consideration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub file_path: String,
    pub metadata: ParsedMetadata,
    pub status: ImportStatus,
    /// Set for duplicates found in the index and for conflicts
    pub existing_id: Option<i64>,
    pub existing_path: Option<String>,
    /// `None` until the artist exists
    pub artist_id: Option<i64>,
    pub artist_is_new: bool,
    pub genre_ids: [i64; 3],
    pub decade_id: i64,
    pub user_decision: Option<UserDecision>,
    /// Current state of the conflicting record
    pub existing_record: Option<InventoryRecord>,
    /// Fields an independent import would set differently
    #[serde(default)]
    pub diff: Vec<FieldDiff>,
    /// Tag read failure that forced a file-name parse
    pub tag_error: Option<String>,
}

impl ImportCandidate {
    pub fn new(file_path: impl Into<String>, metadata: ParsedMetadata, unclassified_genre_id: i64) -> Self {
        Self {
            file_path: file_path.into(),
            metadata,
            status: ImportStatus::New,
            existing_id: None,
            existing_path: None,
            artist_id: None,
            artist_is_new: false,
            genre_ids: [unclassified_genre_id, 0, 0],
            decade_id: 0,
            user_decision: None,
            existing_record: None,
            diff: Vec::new(),
            tag_error: None,
        }
    }

    /// Conflict decision, skip when none was made
    pub fn decision(&self) -> UserDecision {
        self.user_decision.unwrap_or(UserDecision::Skip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Created,
    Merged,
    Skipped,
    Error,
}

/// Outcome of executing one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub file_path: String,
    pub success: bool,
    pub action: ImportAction,
    /// New id when created, existing id when merged
    pub record_id: Option<i64>,
    pub artist_id: Option<i64>,
    /// Whether this candidate created its artist
    pub artist_created: bool,
    pub error: Option<String>,
}

impl ImportResult {
    pub fn created(file_path: &str, record_id: i64, artist_id: i64, artist_created: bool) -> Self {
        Self {
            file_path: file_path.to_string(),
            success: true,
            action: ImportAction::Created,
            record_id: Some(record_id),
            artist_id: Some(artist_id),
            artist_created,
            error: None,
        }
    }

    pub fn merged(file_path: &str, record_id: i64) -> Self {
        Self {
            file_path: file_path.to_string(),
            success: true,
            action: ImportAction::Merged,
            record_id: Some(record_id),
            artist_id: None,
            artist_created: false,
            error: None,
        }
    }

    pub fn skipped(file_path: &str, reason: impl Into<String>) -> Self {
        Self {
            file_path: file_path.to_string(),
            success: false,
            action: ImportAction::Skipped,
            record_id: None,
            artist_id: None,
            artist_created: false,
            error: Some(reason.into()),
        }
    }

    pub fn failed(file_path: &str, error: impl ToString) -> Self {
        Self {
            file_path: file_path.to_string(),
            success: false,
            action: ImportAction::Error,
            record_id: None,
            artist_id: None,
            artist_created: false,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregate of one execution batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub successful: usize,
    pub skipped: usize,
    pub errors: usize,
    pub artists_created: usize,
    pub conflicts_resolved: usize,
    pub results: Vec<ImportResult>,
}

impl ImportSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn record(&mut self, result: ImportResult, status: ImportStatus) {
        if result.success {
            self.successful += 1;
            if result.artist_created {
                self.artists_created += 1;
            }
            if status == ImportStatus::Conflict {
                self.conflicts_resolved += 1;
            }
        } else if result.action == ImportAction::Skipped {
            self.skipped += 1;
        } else {
            self.errors += 1;
        }
        self.results.push(result);
    }
}

/// Import classifier and executor over one inventory.
///
/// The inventory index is built lazily on first use and kept until
/// [`ImportService::clear_cache`]; call it whenever the inventory changed
/// outside this service.
pub struct ImportService<'a> {
    ctx: &'a ReconcileContext,
    store: &'a dyn InventoryStore,
    artists: &'a dyn ArtistDirectory,
    tags: &'a dyn TagSource,
    index: Option<InventoryIndex>,
    /// Artist name -> id for artists resolved during the current batch
    artist_cache: HashMap<String, i64>,
}

impl<'a> ImportService<'a> {
    pub fn new(
        ctx: &'a ReconcileContext,
        store: &'a dyn InventoryStore,
        artists: &'a dyn ArtistDirectory,
        tags: &'a dyn TagSource,
    ) -> Self {
        Self {
            ctx,
            store,
            artists,
            tags,
            index: None,
            artist_cache: HashMap::new(),
        }
    }

    /// Drop the inventory index and artist cache
    pub fn clear_cache(&mut self) {
        self.index = None;
        self.artist_cache.clear();
    }

    pub fn index(&self) -> Option<&InventoryIndex> {
        self.index.as_ref()
    }

    /// Build the index if it is not loaded yet
    fn ensure_index(&mut self) -> Result<(), ImportError> {
        if self.index.is_none() {
            let records = self.store.fetch(&RecordFilter::all())?;
            let index = InventoryIndex::build(&records, &self.ctx.resolver);
            info!(
                "Inventory index built: {} records, {} paths, {} artist/title keys",
                records.len(),
                index.path_count(),
                index.key_count()
            );
            self.index = Some(index);
        }
        Ok(())
    }
}
