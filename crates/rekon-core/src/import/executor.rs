//! Execute: apply classified candidates to the inventory.
//!
//! Writes are sequential and unguarded. A failing candidate becomes an
//! `error` result and the batch moves on; nothing already written is
//! rolled back.

use tracing::{debug, error, info, warn};

use super::{ImportCandidate, ImportResult, ImportService, ImportStatus, ImportSummary, UserDecision};
use crate::fields::{Field, FieldValue};
use crate::inventory::{InventoryRecord, StoreError};

impl ImportService<'_> {
    /// Apply candidates and summarize the outcome.
    ///
    /// # Arguments
    /// * `candidates` - Classified candidates, decisions attached to conflicts
    /// * `progress_fn` - Optional callback (current, total, result) after each candidate
    pub fn execute<F>(
        &mut self,
        candidates: Vec<ImportCandidate>,
        mut progress_fn: Option<F>,
    ) -> ImportSummary
    where
        F: FnMut(usize, usize, &ImportResult),
    {
        if let Err(e) = self.ensure_index() {
            warn!("Executing without duplicate re-check: {}", e);
        }
        self.artist_cache.clear();

        let total = candidates.len();
        let mut summary = ImportSummary {
            total,
            ..Default::default()
        };

        for (idx, candidate) in candidates.iter().enumerate() {
            let result = self.import_candidate(candidate);
            if let Some(ref mut f) = progress_fn {
                f(idx + 1, total, &result);
            }
            summary.record(result, candidate.status);
        }

        info!(
            "Import finished: {} total, {} ok, {} skipped, {} errors, {} new artists",
            summary.total,
            summary.successful,
            summary.skipped,
            summary.errors,
            summary.artists_created
        );
        summary
    }

    fn import_candidate(&mut self, candidate: &ImportCandidate) -> ImportResult {
        match candidate.status {
            ImportStatus::Duplicate => {
                ImportResult::skipped(&candidate.file_path, "Duplicate path exists")
            }
            ImportStatus::Conflict => match candidate.decision() {
                UserDecision::Skip => {
                    ImportResult::skipped(&candidate.file_path, "Conflict skipped")
                }
                UserDecision::Merge => self.merge_into_existing(candidate),
                UserDecision::Import => self.create_record(candidate),
            },
            ImportStatus::New => self.create_record(candidate),
        }
    }

    fn path_taken(&self, path: &str) -> bool {
        self.index.as_ref().is_some_and(|index| index.contains_path(path))
    }

    fn create_record(&mut self, candidate: &ImportCandidate) -> ImportResult {
        let path = &candidate.file_path;
        if self.path_taken(path) {
            debug!("Skipping {}: path imported earlier in this batch", path);
            return ImportResult::skipped(path, "Duplicate path exists");
        }

        let (artist_id, artist_created) = match candidate.artist_id {
            Some(id) => (id, false),
            None => match self.ensure_artist(&candidate.metadata.artist) {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!("Failed to create artist {:?}: {}", candidate.metadata.artist, e);
                    return ImportResult::failed(path, format!("Failed to create artist: {e}"));
                }
            },
        };

        let mut payload = self.insertion_payload(candidate);
        payload.artist_id = artist_id;

        match self.store.insert(&payload) {
            Ok(id) if id > 0 => {
                if let Some(index) = self.index.as_mut() {
                    index.insert_record(InventoryRecord {
                        id,
                        fields: payload,
                    });
                }
                ImportResult::created(path, id, artist_id, artist_created)
            }
            Ok(id) => ImportResult::failed(path, format!("Insert returned invalid id {id}")),
            Err(e) => {
                error!("Insert failed for {}: {}", path, e);
                ImportResult::failed(path, e)
            }
        }
    }

    fn merge_into_existing(&mut self, candidate: &ImportCandidate) -> ImportResult {
        let path = &candidate.file_path;
        let Some(existing_id) = candidate.existing_id else {
            return ImportResult::failed(path, "No existing record id for merge");
        };
        if self.path_taken(path) {
            return ImportResult::skipped(path, "Duplicate path exists");
        }

        let stored = self.ctx.resolver.to_stored(path);
        let change = [(Field::Path, FieldValue::Text(stored.clone()))];
        match self.store.update(existing_id, &change) {
            Ok(true) => {
                if let Some(index) = self.index.as_mut() {
                    index.relocate(existing_id, &stored);
                }
                ImportResult::merged(path, existing_id)
            }
            Ok(false) => ImportResult::failed(path, StoreError::NotFound(existing_id)),
            Err(e) => {
                error!("Merge failed for record {}: {}", existing_id, e);
                ImportResult::failed(path, e)
            }
        }
    }

    /// Id of the named artist, creating it on first use in this batch.
    /// The flag tells whether this call created it.
    fn ensure_artist(&mut self, name: &str) -> Result<(i64, bool), StoreError> {
        if let Some(id) = self.artist_cache.get(name) {
            return Ok((*id, false));
        }

        let resolved = match self.artists.find_by_name(name)? {
            Some(id) => (id, false),
            None => {
                let id = self.artists.create(name)?;
                info!("Created artist {:?} ({})", name, id);
                (id, true)
            }
        };
        self.artist_cache.insert(name.to_string(), resolved.0);
        Ok(resolved)
    }
}
