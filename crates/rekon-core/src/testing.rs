//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::fields::{Field, FieldValue};
use crate::inventory::{
    ArtistDirectory, InventoryRecord, InventoryStore, NewRecord, RecordFilter, StoreError,
    StoreResult,
};
use crate::normalize::normalize_path;
use crate::snapshot::FileSource;

pub fn record(id: i64, artist: &str, title: &str, path: &str) -> InventoryRecord {
    let mut r = InventoryRecord {
        id,
        ..Default::default()
    };
    r.fields.artist = artist.to_string();
    r.fields.title = title.to_string();
    r.fields.path = path.to_string();
    r
}

#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<Vec<InventoryRecord>>,
    next_id: Cell<i64>,
    failing_titles: RefCell<HashSet<String>>,
    pub fail_fetch: Cell<bool>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<InventoryRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            records: RefCell::new(records),
            next_id: Cell::new(next_id),
            ..Default::default()
        }
    }

    /// Make inserts of records with this title fail
    pub fn fail_inserts_titled(&self, title: &str) {
        self.failing_titles.borrow_mut().insert(title.to_string());
    }

    pub fn records(&self) -> Vec<InventoryRecord> {
        self.records.borrow().clone()
    }

    pub fn get(&self, id: i64) -> Option<InventoryRecord> {
        self.records.borrow().iter().find(|r| r.id == id).cloned()
    }
}

impl InventoryStore for MemoryStore {
    fn fetch(&self, filter: &RecordFilter) -> StoreResult<Vec<InventoryRecord>> {
        if self.fail_fetch.get() {
            return Err(StoreError::Backend("database is locked".into()));
        }
        let records = self.records.borrow();
        let matched = records.iter().filter(|r| filter.matches(r)).cloned();
        Ok(match filter.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    fn fetch_one(&self, id: i64) -> StoreResult<Option<InventoryRecord>> {
        Ok(self.get(id))
    }

    fn insert(&self, record: &NewRecord) -> StoreResult<i64> {
        if self.failing_titles.borrow().contains(&record.title) {
            return Err(StoreError::Backend(format!("insert rejected: {}", record.title)));
        }
        let id = self.next_id.get().max(1);
        self.next_id.set(id + 1);
        self.records.borrow_mut().push(InventoryRecord {
            id,
            fields: record.clone(),
        });
        Ok(id)
    }

    fn update(&self, id: i64, changes: &[(Field, FieldValue)]) -> StoreResult<bool> {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        for (field, value) in changes {
            record.fields.set(*field, value);
        }
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryArtists {
    artists: RefCell<Vec<(i64, String)>>,
    pub creates: Cell<usize>,
    pub fail_lookups: Cell<bool>,
}

impl MemoryArtists {
    pub fn with_artists(artists: &[(i64, &str)]) -> Self {
        Self {
            artists: RefCell::new(artists.iter().map(|(id, n)| (*id, n.to_string())).collect()),
            ..Default::default()
        }
    }
}

impl ArtistDirectory for MemoryArtists {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<i64>> {
        if self.fail_lookups.get() {
            return Err(StoreError::Backend("artist table unavailable".into()));
        }
        Ok(self
            .artists
            .borrow()
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| *id))
    }

    fn create(&self, name: &str) -> StoreResult<i64> {
        if let Some((id, _)) = self.artists.borrow().iter().find(|(_, n)| n == name) {
            return Ok(*id);
        }
        let id = 1000 + self.artists.borrow().len() as i64;
        self.artists.borrow_mut().push((id, name.to_string()));
        self.creates.set(self.creates.get() + 1);
        Ok(id)
    }
}

/// Live filesystem stand-in: a fixed set of paths
#[derive(Default)]
pub struct MemoryFiles {
    paths: Vec<String>,
}

impl MemoryFiles {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl FileSource for MemoryFiles {
    fn exists(&self, path: &str) -> bool {
        let key = normalize_path(path);
        self.paths.iter().any(|p| normalize_path(p.as_str()) == key)
    }

    fn all_paths(&self) -> Vec<String> {
        self.paths.clone()
    }
}
