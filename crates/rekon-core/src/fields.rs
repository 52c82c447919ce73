//! Inventory field mapping.
//!
//! The inventory uses the legacy automation column layout (`fldTitle`,
//! `fldFilename`, `fldCat1a`, ...). Everything in the core talks about
//! fields through [`Field`]; the column, canonical and display names come
//! from one static table indexed by the enum discriminant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One mapped inventory column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    ArtistId,
    Artist,
    Title,
    Path,
    Duration,
    Album,
    Year,
    Composer,
    Publisher,
    Isrc,
    GenrePrimary,
    GenreSecondary,
    GenreTertiary,
    Decade,
    Tempo,
    Enabled,
    EnabledAuto,
    VocalPresent,
    Priority,
    IntroPosition,
    MixPosition,
    FadeDuration,
    FadePosition,
    StartPosition,
    FadeInDuration,
    Volume,
    Broadcasts,
    VoteCount,
    NoRds,
    DoNotAutoAlter,
}

/// Storage type of a field's column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Real,
    Text,
    Bool,
}

/// Row of the mapping table
#[derive(Debug)]
pub struct FieldSpec {
    pub field: Field,
    pub column: &'static str,
    pub name: &'static str,
    pub display_name: &'static str,
    pub kind: FieldKind,
}

const fn spec(
    field: Field,
    column: &'static str,
    name: &'static str,
    display_name: &'static str,
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        field,
        column,
        name,
        display_name,
        kind,
    }
}

/// Mapping table, in [`Field`] declaration order
pub static FIELDS: &[FieldSpec] = &[
    spec(Field::Id, "AUID", "id", "ID", FieldKind::Int),
    spec(Field::ArtistId, "fldArtistCode", "artist_id", "Artist Code", FieldKind::Int),
    spec(Field::Artist, "fldArtistName", "artist", "Artist", FieldKind::Text),
    spec(Field::Title, "fldTitle", "title", "Title", FieldKind::Text),
    spec(Field::Path, "fldFilename", "path", "File", FieldKind::Text),
    spec(Field::Duration, "fldDuration", "duration", "Duration", FieldKind::Real),
    spec(Field::Album, "fldAlbum", "album", "Album", FieldKind::Text),
    spec(Field::Year, "fldYear", "year", "Year", FieldKind::Int),
    spec(Field::Composer, "fldComposer", "composer", "Composer", FieldKind::Text),
    spec(Field::Publisher, "fldLabel", "publisher", "Publisher", FieldKind::Text),
    spec(Field::Isrc, "fldCDKey", "isrc", "ISRC", FieldKind::Text),
    spec(Field::GenrePrimary, "fldCat1a", "genre_primary", "Genre", FieldKind::Int),
    spec(Field::GenreSecondary, "fldCat1b", "genre_secondary", "Genre 2", FieldKind::Int),
    spec(Field::GenreTertiary, "fldCat1c", "genre_tertiary", "Genre 3", FieldKind::Int),
    spec(Field::Decade, "fldCat2", "decade_id", "Decade", FieldKind::Int),
    spec(Field::Tempo, "fldCat3", "tempo_id", "Tempo", FieldKind::Int),
    spec(Field::Enabled, "fldEnabled", "enabled", "Enabled", FieldKind::Bool),
    spec(Field::EnabledAuto, "fldEnabledAuto", "enabled_auto", "Auto Enabled", FieldKind::Bool),
    spec(Field::VocalPresent, "fldVocalPresent", "vocal_present", "Vocal", FieldKind::Bool),
    spec(Field::Priority, "fldPriority", "priority", "Priority", FieldKind::Int),
    spec(Field::IntroPosition, "fldIntroPos", "intro", "Intro", FieldKind::Real),
    spec(Field::MixPosition, "fldMixPos", "mix", "Mix", FieldKind::Real),
    spec(Field::FadeDuration, "fldFadeDur", "fade_duration", "Fade Duration", FieldKind::Real),
    spec(Field::FadePosition, "fldFadePos", "fade_position", "Fade Position", FieldKind::Real),
    spec(Field::StartPosition, "fldStartPos", "start_position", "Start", FieldKind::Real),
    spec(Field::FadeInDuration, "fldFadeInDur", "fade_in", "Fade In", FieldKind::Real),
    spec(Field::Volume, "fldVolume", "volume", "Volume", FieldKind::Int),
    spec(Field::Broadcasts, "fldBroadcasts", "broadcasts", "Broadcasts", FieldKind::Int),
    spec(Field::VoteCount, "fldVoteCount", "vote_count", "Votes", FieldKind::Int),
    spec(Field::NoRds, "fldNoRDS", "no_rds", "No RDS", FieldKind::Bool),
    spec(Field::DoNotAutoAlter, "fldDoNotAutoAlter", "do_not_auto_alter", "Locked", FieldKind::Bool),
];

impl Field {
    pub const ALL: [Field; 31] = [
        Field::Id,
        Field::ArtistId,
        Field::Artist,
        Field::Title,
        Field::Path,
        Field::Duration,
        Field::Album,
        Field::Year,
        Field::Composer,
        Field::Publisher,
        Field::Isrc,
        Field::GenrePrimary,
        Field::GenreSecondary,
        Field::GenreTertiary,
        Field::Decade,
        Field::Tempo,
        Field::Enabled,
        Field::EnabledAuto,
        Field::VocalPresent,
        Field::Priority,
        Field::IntroPosition,
        Field::MixPosition,
        Field::FadeDuration,
        Field::FadePosition,
        Field::StartPosition,
        Field::FadeInDuration,
        Field::Volume,
        Field::Broadcasts,
        Field::VoteCount,
        Field::NoRds,
        Field::DoNotAutoAlter,
    ];

    pub fn spec(self) -> &'static FieldSpec {
        &FIELDS[self as usize]
    }

    /// Storage column name
    pub fn column(self) -> &'static str {
        self.spec().column
    }

    /// Canonical snake_case name
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    /// Look up a field by storage column (case-insensitive)
    pub fn from_column(column: &str) -> Option<Field> {
        FIELDS
            .iter()
            .find(|s| s.column.eq_ignore_ascii_case(column))
            .map(|s| s.field)
    }

    /// Look up a field by canonical name
    pub fn from_name(name: &str) -> Option<Field> {
        FIELDS.iter().find(|s| s.name == name).map(|s| s.field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Field::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown field: {name}")))
    }
}

/// Typed value of a single field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Real(v) => Some(*v as i64),
            FieldValue::Bool(v) => Some(*v as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bool(_) | FieldValue::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            FieldValue::Int(v) => Some(*v != 0),
            FieldValue::Real(v) => Some(*v != 0.0),
            FieldValue::Text(_) | FieldValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality used for conflict diffs: reals within 0.01 are equal
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Real(a), FieldValue::Real(b)) => (a - b).abs() < 0.01,
            _ => self == other,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("-"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Real(v) => write!(f, "{v:.2}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A field whose value would change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: Field,
    pub new: FieldValue,
    pub old: FieldValue,
}
