//! Preview: classify discovered files without writing anything.

use tracing::{debug, info, warn};

use super::{ImportCandidate, ImportError, ImportService, ImportStatus};
use crate::fields::{Field, FieldDiff};
use crate::inventory::{InventoryRecord, NewRecord};
use crate::parser::ParseOutcome;

impl ImportService<'_> {
    /// Classify files as new, duplicate or conflict and resolve their
    /// artist/genre/decade linkage.
    ///
    /// # Arguments
    /// * `paths` - Discovered file paths
    /// * `progress_fn` - Optional progress callback (current, total)
    ///
    /// # Returns
    /// One candidate per path, in input order. Fails only when the
    /// inventory index cannot be loaded.
    pub fn preview<S, F>(
        &mut self,
        paths: &[S],
        mut progress_fn: Option<F>,
    ) -> Result<Vec<ImportCandidate>, ImportError>
    where
        S: AsRef<str>,
        F: FnMut(usize, usize),
    {
        self.ensure_index()?;

        let total = paths.len();
        let mut candidates = Vec::with_capacity(total);
        for (idx, path) in paths.iter().enumerate() {
            candidates.push(self.analyze(path.as_ref()));
            if let Some(ref mut f) = progress_fn {
                f(idx + 1, total);
            }
        }

        let count = |status| candidates.iter().filter(|c| c.status == status).count();
        info!(
            "Preview of {} files: {} new, {} duplicate, {} conflict",
            total,
            count(ImportStatus::New),
            count(ImportStatus::Duplicate),
            count(ImportStatus::Conflict)
        );

        Ok(candidates)
    }

    /// Record that execution would insert for a candidate.
    ///
    /// Artists still to be created carry the placeholder id -1.
    pub fn insertion_payload(&self, candidate: &ImportCandidate) -> NewRecord {
        let meta = &candidate.metadata;
        let defaults = &self.ctx.config.record_defaults;
        NewRecord {
            artist_id: candidate.artist_id.unwrap_or(-1),
            artist: meta.artist.clone(),
            title: meta.title.clone(),
            path: self.ctx.resolver.to_stored(&candidate.file_path),
            duration: meta.duration,
            album: meta.album.clone(),
            year: meta.year,
            composer: meta.composer.clone(),
            publisher: meta.publisher.clone(),
            isrc: meta.isrc.clone(),
            genre_ids: candidate.genre_ids,
            decade_id: candidate.decade_id,
            tempo_id: defaults.tempo_id,
            enabled: defaults.enabled,
            enabled_auto: defaults.enabled_auto,
            vocal_present: defaults.vocal_present,
            priority: defaults.priority,
            intro: defaults.intro,
            mix: defaults.mix,
            fade_duration: defaults.fade_duration,
            fade_position: defaults.fade_position,
            start_position: defaults.start_position,
            fade_in: defaults.fade_in,
            volume: defaults.volume,
            broadcasts: defaults.broadcasts,
            vote_count: defaults.vote_count,
            no_rds: defaults.no_rds,
            do_not_auto_alter: defaults.do_not_auto_alter,
        }
    }

    fn analyze(&self, path: &str) -> ImportCandidate {
        let outcome = self.ctx.parser.parse_with(path, self.tags);
        let tag_error = match &outcome {
            ParseOutcome::TagsFailed { error, .. } => Some(error.to_string()),
            _ => None,
        };

        let mut candidate =
            ImportCandidate::new(path, outcome.into_metadata(), self.ctx.unclassified_genre_id());
        candidate.tag_error = tag_error;

        let Some(index) = self.index.as_ref() else {
            return candidate;
        };

        if index.contains_path(path) {
            candidate.status = ImportStatus::Duplicate;
            return candidate;
        }

        let existing = index
            .conflict_for(&candidate.metadata.artist, &candidate.metadata.title)
            .cloned();
        self.resolve_linkage(&mut candidate);

        if let Some(indexed) = existing {
            candidate.status = ImportStatus::Conflict;
            candidate.existing_id = Some(indexed.id);
            candidate.existing_path = Some(indexed.path().to_string());

            let current = match self.store.fetch_one(indexed.id) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    warn!("Conflicting record {} vanished, using indexed copy", indexed.id);
                    indexed
                }
                Err(e) => {
                    warn!("Failed to fetch conflicting record {}: {}", indexed.id, e);
                    indexed
                }
            };
            candidate.diff = diff_fields(&self.insertion_payload(&candidate), &current);
            candidate.existing_record = Some(current);
        }

        candidate
    }

    fn resolve_linkage(&self, candidate: &mut ImportCandidate) {
        let taxonomy = &self.ctx.taxonomy;
        candidate.genre_ids =
            taxonomy.resolve_genres(&candidate.metadata.genre, self.ctx.unclassified_genre_id());
        candidate.decade_id = taxonomy.resolve_decade(candidate.metadata.year);

        match self.artists.find_by_name(&candidate.metadata.artist) {
            Ok(Some(id)) => {
                candidate.artist_id = Some(id);
                candidate.artist_is_new = false;
            }
            Ok(None) => {
                candidate.artist_id = None;
                candidate.artist_is_new = true;
            }
            Err(e) => {
                warn!(
                    "Artist lookup failed for {:?}, treating as new: {}",
                    candidate.metadata.artist, e
                );
                candidate.artist_id = None;
                candidate.artist_is_new = true;
            }
        }
        debug!(
            "Linkage for {}: artist {:?}, genres {:?}, decade {}",
            candidate.file_path, candidate.artist_id, candidate.genre_ids, candidate.decade_id
        );
    }
}

/// Fields where `payload` differs from `existing`; the artist id is left
/// out since a payload may only carry a placeholder
fn diff_fields(payload: &NewRecord, existing: &InventoryRecord) -> Vec<FieldDiff> {
    payload
        .fields()
        .into_iter()
        .filter(|(field, _)| *field != Field::ArtistId)
        .filter_map(|(field, new)| {
            let old = existing.get(field);
            (!new.same_as(&old)).then_some(FieldDiff { field, new, old })
        })
        .collect()
}
