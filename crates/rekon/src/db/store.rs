//! SQLite-backed collaborators for the reconciler.

use rekon_core::inventory::{RecordFilter, StoreResult};
use rekon_core::{
    ArtistDirectory, Field, FieldValue, InventoryRecord, InventoryStore, NewRecord, StoreError,
};

use crate::db::{Database, DbError, artists, songs};

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Constraint(msg) => StoreError::Rejected(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Song inventory over `snDatabase`
#[derive(Clone)]
pub struct SqliteInventory {
    db: Database,
}

impl SqliteInventory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl InventoryStore for SqliteInventory {
    fn fetch(&self, filter: &RecordFilter) -> StoreResult<Vec<InventoryRecord>> {
        Ok(self.db.with_conn(|conn| songs::get_songs(conn, filter))?)
    }

    fn fetch_one(&self, id: i64) -> StoreResult<Option<InventoryRecord>> {
        Ok(self.db.with_conn(|conn| songs::get_song_by_id(conn, id))?)
    }

    fn insert(&self, record: &NewRecord) -> StoreResult<i64> {
        Ok(self.db.with_conn(|conn| songs::add_song(conn, record))?)
    }

    fn update(&self, id: i64, changes: &[(Field, FieldValue)]) -> StoreResult<bool> {
        Ok(self
            .db
            .transaction(|conn| songs::update_song_fields(conn, id, changes))?)
    }
}

/// Artist directory over `snArtists`
#[derive(Clone)]
pub struct SqliteArtists {
    db: Database,
}

impl SqliteArtists {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ArtistDirectory for SqliteArtists {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .db
            .with_conn(|conn| artists::find_artist_by_name(conn, name))?)
    }

    fn create(&self, name: &str) -> StoreResult<i64> {
        let (id, _) = self
            .db
            .transaction(|conn| artists::get_or_create_artist(conn, name))?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_round_trip_through_traits() {
        let db = Database::new_in_memory().unwrap();
        let store = SqliteInventory::new(db.clone());

        let payload = NewRecord {
            artist: "Queen".into(),
            title: "Bicycle".into(),
            path: "b:\\q.mp3".into(),
            ..Default::default()
        };
        let id = store.insert(&payload).unwrap();

        assert_eq!(store.fetch_one(id).unwrap().unwrap().title(), "Bicycle");
        assert!(store.update(id, &[(Field::Title, "Bicycle Race".into())]).unwrap());
        assert_eq!(
            store.fetch(&RecordFilter::with_path("b:\\q.mp3")).unwrap()[0].title(),
            "Bicycle Race"
        );
        assert!(!store.update(id + 10, &[(Field::Title, "x".into())]).unwrap());
    }

    #[test]
    fn test_constraint_maps_to_rejected() {
        let db = Database::new_in_memory().unwrap();
        let store = SqliteInventory::new(db.clone());
        let err = store.update(1, &[(Field::Id, FieldValue::Int(2))]).unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        let artists = SqliteArtists::new(db);
        assert!(matches!(artists.create(""), Err(StoreError::Rejected(_))));
    }

    #[test]
    fn test_unknown_id_is_absent_not_an_error() {
        let store = SqliteInventory::new(Database::new_in_memory().unwrap());
        assert!(store.fetch_one(42).unwrap().is_none());
        assert!(!store.update(42, &[(Field::Title, "x".into())]).unwrap());

        let err: StoreError = DbError::Sqlite(rusqlite::Error::InvalidQuery).into();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_artist_directory() {
        let artists = SqliteArtists::new(Database::new_in_memory().unwrap());
        assert_eq!(artists.find_by_name("ABBA").unwrap(), None);
        let id = artists.create("ABBA").unwrap();
        assert_eq!(artists.create("ABBA").unwrap(), id);
        assert_eq!(artists.find_by_name("ABBA").unwrap(), Some(id));
    }
}
