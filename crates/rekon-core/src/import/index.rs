//! In-memory lookup structures over the inventory.

use std::collections::HashMap;

use crate::inventory::InventoryRecord;
use crate::normalize::{artist_title_key, normalize_path};
use crate::paths::PathResolver;

/// Existing paths and artist/title keys of the inventory.
///
/// Paths are keyed in their local form (after drive remapping) so that
/// stored and discovered paths compare equal. Several records may share a
/// path; the set is reference counted so removing one keeps the others.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex {
    resolver: PathResolver,
    paths: HashMap<String, usize>,
    path_by_id: HashMap<i64, String>,
    by_artist_title: HashMap<String, InventoryRecord>,
}

impl InventoryIndex {
    /// Index a set of records. For a repeated artist/title key the record
    /// with the lowest id wins.
    pub fn build(records: &[InventoryRecord], resolver: &PathResolver) -> Self {
        let mut index = Self {
            resolver: resolver.clone(),
            ..Default::default()
        };

        let mut sorted: Vec<&InventoryRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.id);
        for record in sorted {
            index.insert_record(record.clone());
        }
        index
    }

    /// Comparison key for a stored or local path
    pub fn path_key(&self, path: &str) -> String {
        normalize_path(self.resolver.to_local(path).as_str())
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(&self.path_key(path))
    }

    /// Record already holding this artist/title, if any
    pub fn conflict_for(&self, artist: &str, title: &str) -> Option<&InventoryRecord> {
        self.by_artist_title.get(&artist_title_key(artist, title))
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn key_count(&self) -> usize {
        self.by_artist_title.len()
    }

    /// Add a record that now exists in the inventory.
    ///
    /// Afterwards `contains_path(record.path())` holds, and the record owns
    /// its artist/title key unless another record already did.
    pub fn insert_record(&mut self, record: InventoryRecord) {
        let key = self.path_key(record.path());
        if !key.is_empty() {
            *self.paths.entry(key.clone()).or_insert(0) += 1;
            self.path_by_id.insert(record.id, key);
        }

        self.by_artist_title
            .entry(artist_title_key(record.artist(), record.title()))
            .or_insert(record);
    }

    /// Record that `id` now points at `new_path`.
    ///
    /// Afterwards `contains_path(new_path)` holds, and the old path is gone
    /// unless another record still uses it.
    pub fn relocate(&mut self, id: i64, new_path: &str) {
        let new_key = self.path_key(new_path);

        if let Some(old_key) = self.path_by_id.remove(&id) {
            if let Some(count) = self.paths.get_mut(&old_key) {
                *count -= 1;
                if *count == 0 {
                    self.paths.remove(&old_key);
                }
            }
        }

        if !new_key.is_empty() {
            *self.paths.entry(new_key.clone()).or_insert(0) += 1;
            self.path_by_id.insert(id, new_key);
        }

        if let Some(record) = self.by_artist_title.values_mut().find(|r| r.id == id) {
            record.fields.path = new_path.to_string();
        }
    }
}
