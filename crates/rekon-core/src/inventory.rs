//! Inventory record model and the storage collaborators the core consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::{Field, FieldValue};

/// Failure reported by a storage collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Column values of one inventory row, without its id.
///
/// Also the insert payload: see [`NewRecord`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    pub artist_id: i64,
    pub artist: String,
    pub title: String,
    pub path: String,
    pub duration: f64,
    pub album: String,
    pub year: i64,
    pub composer: String,
    pub publisher: String,
    pub isrc: String,
    pub genre_ids: [i64; 3],
    pub decade_id: i64,
    pub tempo_id: i64,
    pub enabled: bool,
    pub enabled_auto: bool,
    pub vocal_present: bool,
    pub priority: i64,
    pub intro: f64,
    pub mix: f64,
    pub fade_duration: f64,
    pub fade_position: f64,
    pub start_position: f64,
    pub fade_in: f64,
    pub volume: i64,
    pub broadcasts: i64,
    pub vote_count: i64,
    pub no_rds: bool,
    pub do_not_auto_alter: bool,
}

/// Payload handed to [`InventoryStore::insert`]
pub type NewRecord = RecordFields;

impl RecordFields {
    /// Typed value of a field. [`Field::Id`] has no value here.
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Id => FieldValue::Null,
            Field::ArtistId => self.artist_id.into(),
            Field::Artist => self.artist.as_str().into(),
            Field::Title => self.title.as_str().into(),
            Field::Path => self.path.as_str().into(),
            Field::Duration => self.duration.into(),
            Field::Album => self.album.as_str().into(),
            Field::Year => self.year.into(),
            Field::Composer => self.composer.as_str().into(),
            Field::Publisher => self.publisher.as_str().into(),
            Field::Isrc => self.isrc.as_str().into(),
            Field::GenrePrimary => self.genre_ids[0].into(),
            Field::GenreSecondary => self.genre_ids[1].into(),
            Field::GenreTertiary => self.genre_ids[2].into(),
            Field::Decade => self.decade_id.into(),
            Field::Tempo => self.tempo_id.into(),
            Field::Enabled => self.enabled.into(),
            Field::EnabledAuto => self.enabled_auto.into(),
            Field::VocalPresent => self.vocal_present.into(),
            Field::Priority => self.priority.into(),
            Field::IntroPosition => self.intro.into(),
            Field::MixPosition => self.mix.into(),
            Field::FadeDuration => self.fade_duration.into(),
            Field::FadePosition => self.fade_position.into(),
            Field::StartPosition => self.start_position.into(),
            Field::FadeInDuration => self.fade_in.into(),
            Field::Volume => self.volume.into(),
            Field::Broadcasts => self.broadcasts.into(),
            Field::VoteCount => self.vote_count.into(),
            Field::NoRds => self.no_rds.into(),
            Field::DoNotAutoAlter => self.do_not_auto_alter.into(),
        }
    }

    /// Assign a field from a loosely typed value.
    ///
    /// NULL and unconvertible values reset the field to its zero value,
    /// which is how the legacy store reads empty columns.
    pub fn set(&mut self, field: Field, value: &FieldValue) {
        let int = || value.as_i64().unwrap_or(0);
        let real = || value.as_f64().unwrap_or(0.0);
        let flag = || value.as_bool().unwrap_or(false);
        let text = || match value {
            FieldValue::Null => String::new(),
            other => other.to_string(),
        };

        match field {
            Field::Id => {}
            Field::ArtistId => self.artist_id = int(),
            Field::Artist => self.artist = text(),
            Field::Title => self.title = text(),
            Field::Path => self.path = text(),
            Field::Duration => self.duration = real(),
            Field::Album => self.album = text(),
            Field::Year => self.year = int(),
            Field::Composer => self.composer = text(),
            Field::Publisher => self.publisher = text(),
            Field::Isrc => self.isrc = text(),
            Field::GenrePrimary => self.genre_ids[0] = int(),
            Field::GenreSecondary => self.genre_ids[1] = int(),
            Field::GenreTertiary => self.genre_ids[2] = int(),
            Field::Decade => self.decade_id = int(),
            Field::Tempo => self.tempo_id = int(),
            Field::Enabled => self.enabled = flag(),
            Field::EnabledAuto => self.enabled_auto = flag(),
            Field::VocalPresent => self.vocal_present = flag(),
            Field::Priority => self.priority = int(),
            Field::IntroPosition => self.intro = real(),
            Field::MixPosition => self.mix = real(),
            Field::FadeDuration => self.fade_duration = real(),
            Field::FadePosition => self.fade_position = real(),
            Field::StartPosition => self.start_position = real(),
            Field::FadeInDuration => self.fade_in = real(),
            Field::Volume => self.volume = int(),
            Field::Broadcasts => self.broadcasts = int(),
            Field::VoteCount => self.vote_count = int(),
            Field::NoRds => self.no_rds = flag(),
            Field::DoNotAutoAlter => self.do_not_auto_alter = flag(),
        }
    }

    /// Every data field with its value, in table order
    pub fn fields(&self) -> Vec<(Field, FieldValue)> {
        Field::ALL
            .iter()
            .filter(|f| **f != Field::Id)
            .map(|f| (*f, self.get(*f)))
            .collect()
    }
}

/// An existing inventory row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl InventoryRecord {
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Id => FieldValue::Int(self.id),
            other => self.fields.get(other),
        }
    }

    pub fn artist(&self) -> &str {
        &self.fields.artist
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }

    pub fn path(&self) -> &str {
        &self.fields.path
    }
}

/// Exact-match filter for [`InventoryStore::fetch`]
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub path: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Whether a record passes the field conditions (limit is not applied)
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        let eq = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);
        eq(&self.artist, record.artist())
            && eq(&self.title, record.title())
            && eq(&self.path, record.path())
    }
}

/// Read/write access to the inventory
pub trait InventoryStore {
    fn fetch(&self, filter: &RecordFilter) -> StoreResult<Vec<InventoryRecord>>;

    fn fetch_one(&self, id: i64) -> StoreResult<Option<InventoryRecord>>;

    /// Insert a record and return its new id
    fn insert(&self, record: &NewRecord) -> StoreResult<i64>;

    /// Apply field changes; `false` when no row has that id
    fn update(&self, id: i64, changes: &[(Field, FieldValue)]) -> StoreResult<bool>;
}

/// Artist lookup and creation
pub trait ArtistDirectory {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<i64>>;

    /// Create an artist; an existing name returns its id
    fn create(&self, name: &str) -> StoreResult<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip_per_field() {
        let mut fields = RecordFields::default();
        fields.set(Field::Title, &FieldValue::from("Vogue"));
        fields.set(Field::GenreSecondary, &FieldValue::Int(4));
        fields.set(Field::Enabled, &FieldValue::Int(1));
        fields.set(Field::Duration, &FieldValue::Int(200));
        fields.set(Field::Album, &FieldValue::Null);

        assert_eq!(fields.title, "Vogue");
        assert_eq!(fields.genre_ids, [0, 4, 0]);
        assert!(fields.enabled);
        assert_eq!(fields.duration, 200.0);
        assert_eq!(fields.get(Field::Album), FieldValue::Text(String::new()));
    }

    #[test]
    fn test_fields_excludes_id() {
        let fields = RecordFields::default();
        let list = fields.fields();
        assert_eq!(list.len(), Field::ALL.len() - 1);
        assert!(list.iter().all(|(f, _)| *f != Field::Id));
    }

    #[test]
    fn test_record_get_id() {
        let record = InventoryRecord {
            id: 9,
            ..Default::default()
        };
        assert_eq!(record.get(Field::Id), FieldValue::Int(9));
    }

    #[test]
    fn test_filter_matches() {
        let mut record = InventoryRecord::default();
        record.fields.artist = "Madonna".into();
        record.fields.path = "b:\\songs\\vogue.mp3".into();

        assert!(RecordFilter::all().matches(&record));
        assert!(RecordFilter::with_path("b:\\songs\\vogue.mp3").matches(&record));
        assert!(!RecordFilter::with_path("b:\\songs\\other.mp3").matches(&record));
    }
}
