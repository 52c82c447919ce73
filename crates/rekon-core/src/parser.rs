//! Metadata parsing from file names and tag data.
//!
//! Priority is tags > filename > configured fallback. The parser itself
//! never touches the filesystem: tag data is either passed in or read
//! through a [`TagSource`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::{DEFAULT_FALLBACK, ReconcileConfig};
use crate::normalize::{collapse_whitespace, file_name, normalize_for_comparison};

/// Structural separator between artist and title in file names
pub const SEPARATOR: &str = " - ";

static TRACK_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}\.?$").unwrap());

/// Where parsed metadata came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    Tags,
    Filename,
    Fallback,
}

/// Best-effort metadata for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMetadata {
    pub artist: String,
    pub title: String,
    pub album: String,
    /// 0 when unknown
    pub year: i64,
    /// Raw, possibly comma separated genre string
    pub genre: String,
    pub duration: f64,
    pub composer: String,
    pub publisher: String,
    pub isrc: String,
    pub source: ParseSource,
    pub confidence: f64,
}

impl ParsedMetadata {
    fn named(artist: String, title: String, source: ParseSource, confidence: f64) -> Self {
        Self {
            artist,
            title,
            album: String::new(),
            year: 0,
            genre: String::new(),
            duration: 0.0,
            composer: String::new(),
            publisher: String::new(),
            isrc: String::new(),
            source,
            confidence,
        }
    }

    pub fn normalized_artist(&self) -> String {
        normalize_for_comparison(self.artist.as_str())
    }

    pub fn normalized_title(&self) -> String {
        normalize_for_comparison(self.title.as_str())
    }
}

/// Raw tag values as read from a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagData {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    /// Date as stored in the tag ("1985", "1985-03-01", ...)
    pub date: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<f64>,
    pub composer: Option<String>,
    pub publisher: Option<String>,
    pub isrc: Option<String>,
}

impl TagData {
    /// Tags are only trusted when they name an artist or a title
    pub fn has_artist_or_title(&self) -> bool {
        !trimmed(&self.artist).is_empty() || !trimmed(&self.title).is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to read tags from {path}: {reason}")]
pub struct TagReadError {
    pub path: String,
    pub reason: String,
}

impl TagReadError {
    pub fn new(path: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Anything that can produce tag data for a path
pub trait TagSource {
    fn read(&self, path: &str) -> Result<TagData, TagReadError>;
}

/// Tag source that never has tags: parsing uses the file name only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTags;

impl TagSource for NoTags {
    fn read(&self, _path: &str) -> Result<TagData, TagReadError> {
        Ok(TagData::default())
    }
}

/// Pre-read tags keyed by exact path; unknown paths have no tags
impl TagSource for HashMap<String, TagData> {
    fn read(&self, path: &str) -> Result<TagData, TagReadError> {
        Ok(self.get(path).cloned().unwrap_or_default())
    }
}

/// Result of [`MetadataParser::parse_with`]. Every variant carries usable
/// metadata; the variant says how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Tagged(ParsedMetadata),
    FilenameOnly(ParsedMetadata),
    TagsFailed {
        metadata: ParsedMetadata,
        error: TagReadError,
    },
}

impl ParseOutcome {
    pub fn metadata(&self) -> &ParsedMetadata {
        match self {
            ParseOutcome::Tagged(m) | ParseOutcome::FilenameOnly(m) => m,
            ParseOutcome::TagsFailed { metadata, .. } => metadata,
        }
    }

    pub fn into_metadata(self) -> ParsedMetadata {
        match self {
            ParseOutcome::Tagged(m) | ParseOutcome::FilenameOnly(m) => m,
            ParseOutcome::TagsFailed { metadata, .. } => metadata,
        }
    }

    pub fn used_fallback(&self) -> bool {
        !matches!(self, ParseOutcome::Tagged(_))
    }
}

#[derive(Debug, Clone)]
pub struct MetadataParser {
    fallback_artist: String,
    fallback_title: String,
}

impl Default for MetadataParser {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK, DEFAULT_FALLBACK)
    }
}

impl MetadataParser {
    pub fn new(fallback_artist: impl Into<String>, fallback_title: impl Into<String>) -> Self {
        Self {
            fallback_artist: fallback_artist.into(),
            fallback_title: fallback_title.into(),
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(&config.fallback_artist, &config.fallback_title)
    }

    pub fn fallback_artist(&self) -> &str {
        &self.fallback_artist
    }

    /// Parse a file from its name and optional pre-read tags.
    ///
    /// Tags win when they carry an artist or a title; missing artist/title
    /// are then filled from the file name. Without usable tags the file
    /// name result is returned as is.
    pub fn parse(&self, path: &str, tags: Option<&TagData>) -> ParsedMetadata {
        let from_name = self.parse_filename(path);
        match tags {
            Some(tags) if tags.has_artist_or_title() => self.merge(tags, from_name),
            _ => from_name,
        }
    }

    /// Parse a file, reading its tags through `source`.
    ///
    /// A tag read failure is not fatal: the file name result is returned
    /// together with the error.
    pub fn parse_with(&self, path: &str, source: &dyn TagSource) -> ParseOutcome {
        match source.read(path) {
            Ok(tags) if tags.has_artist_or_title() => {
                ParseOutcome::Tagged(self.merge(&tags, self.parse_filename(path)))
            }
            Ok(_) => ParseOutcome::FilenameOnly(self.parse_filename(path)),
            Err(error) => {
                debug!("Tag read failed, using file name: {}", error);
                ParseOutcome::TagsFailed {
                    metadata: self.parse_filename(path),
                    error,
                }
            }
        }
    }

    /// Extract artist/title from the file name alone
    pub fn parse_filename(&self, path: &str) -> ParsedMetadata {
        let name = collapse_whitespace(strip_extension(file_name(path)));
        let parts: Vec<&str> = name.split(SEPARATOR).collect();

        let (artist, title, confidence) = match parts.as_slice() {
            [artist, title] => (artist.trim().to_string(), title.trim().to_string(), 0.7),
            [first, second, rest @ ..] if is_track_number(first) => (
                second.trim().to_string(),
                rest.join(SEPARATOR).trim().to_string(),
                0.6,
            ),
            [first, .., last] => (first.trim().to_string(), last.trim().to_string(), 0.5),
            _ => (String::new(), name.clone(), 0.3),
        };

        ParsedMetadata::named(
            self.or_fallback_artist(artist),
            self.or_fallback_title(title),
            ParseSource::Filename,
            confidence,
        )
    }

    fn merge(&self, tags: &TagData, from_name: ParsedMetadata) -> ParsedMetadata {
        let tag_artist = trimmed(&tags.artist);
        let tag_title = trimmed(&tags.title);
        let confidence = if !tag_artist.is_empty() && !tag_title.is_empty() {
            0.9
        } else {
            0.7
        };

        let artist = if tag_artist.is_empty() {
            from_name.artist
        } else {
            tag_artist.to_string()
        };
        let title = if tag_title.is_empty() {
            from_name.title
        } else {
            tag_title.to_string()
        };

        ParsedMetadata {
            artist: self.or_fallback_artist(artist),
            title: self.or_fallback_title(title),
            album: trimmed(&tags.album).to_string(),
            year: tags.date.as_deref().map(parse_year).unwrap_or(0),
            genre: trimmed(&tags.genre).to_string(),
            duration: tags.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0),
            composer: trimmed(&tags.composer).to_string(),
            publisher: trimmed(&tags.publisher).to_string(),
            isrc: trimmed(&tags.isrc).to_string(),
            source: ParseSource::Tags,
            confidence,
        }
    }

    fn or_fallback_artist(&self, artist: String) -> String {
        if artist.is_empty() {
            self.fallback_artist.clone()
        } else {
            artist
        }
    }

    fn or_fallback_title(&self, title: String) -> String {
        if title.is_empty() {
            self.fallback_title.clone()
        } else {
            title
        }
    }
}

/// Year from a tag date string: first four characters as an integer, else 0
pub fn parse_year(date: &str) -> i64 {
    let head: String = date.trim().chars().take(4).collect();
    head.parse().unwrap_or(0)
}

fn is_track_number(text: &str) -> bool {
    TRACK_NUMBER.is_match(text.trim())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MetadataParser {
        MetadataParser::default()
    }

    struct FailingTags;

    impl TagSource for FailingTags {
        fn read(&self, path: &str) -> Result<TagData, TagReadError> {
            Err(TagReadError::new(path, "corrupt frame"))
        }
    }

    #[test]
    fn test_filename_artist_title() {
        let m = parser().parse_filename("C:/Music/AC-DC - TNT.mp3");
        assert_eq!(m.artist, "AC-DC");
        assert_eq!(m.title, "TNT");
        assert_eq!(m.source, ParseSource::Filename);
        assert_eq!(m.confidence, 0.7);
    }

    #[test]
    fn test_filename_track_number() {
        let m = parser().parse_filename("z:\\songs\\01 - Beatles - Help.mp3");
        assert_eq!(m.artist, "Beatles");
        assert_eq!(m.title, "Help");
        assert_eq!(m.confidence, 0.6);

        let m = parser().parse_filename("07. - Queen - Under - Pressure.mp3");
        assert_eq!(m.artist, "Queen");
        assert_eq!(m.title, "Under - Pressure");
    }

    #[test]
    fn test_filename_artist_album_title() {
        let m = parser().parse_filename("Madonna - Erotica - Rain.mp3");
        assert_eq!(m.artist, "Madonna");
        assert_eq!(m.title, "Rain");
        assert_eq!(m.confidence, 0.5);
    }

    #[test]
    fn test_filename_without_separator() {
        let m = parser().parse_filename("Track01.mp3");
        assert_eq!(m.artist, "Unknown");
        assert_eq!(m.title, "Track01");
        assert_eq!(m.confidence, 0.3);
    }

    #[test]
    fn test_filename_keeps_punctuation_and_collapses_spaces() {
        let m = parser().parse_filename("P!nk   -   So  What.mp3");
        assert_eq!(m.artist, "P!nk");
        assert_eq!(m.title, "So What");
    }

    #[test]
    fn test_filename_empty_parts_use_fallback() {
        let p = MetadataParser::new("Nobody", "Nothing");
        let m = p.parse_filename(".mp3");
        assert_eq!(m.title, ".mp3");

        let m = p.parse_filename("");
        assert_eq!(m.artist, "Nobody");
        assert_eq!(m.title, "Nothing");
    }

    #[test]
    fn test_tags_win_over_filename() {
        let tags = TagData {
            artist: Some("Madonna".into()),
            title: Some("Vogue".into()),
            album: Some(" I'm Breathless ".into()),
            date: Some("1990-03-20".into()),
            genre: Some("Pop, Dance".into()),
            duration: Some(316.0),
            ..Default::default()
        };
        let m = parser().parse("Wrong - Name.mp3", Some(&tags));
        assert_eq!(m.artist, "Madonna");
        assert_eq!(m.title, "Vogue");
        assert_eq!(m.album, "I'm Breathless");
        assert_eq!(m.year, 1990);
        assert_eq!(m.genre, "Pop, Dance");
        assert_eq!(m.source, ParseSource::Tags);
        assert_eq!(m.confidence, 0.9);
    }

    #[test]
    fn test_partial_tags_fill_from_filename() {
        let tags = TagData {
            title: Some("Vogue".into()),
            ..Default::default()
        };
        let m = parser().parse("Madonna - Something.mp3", Some(&tags));
        assert_eq!(m.artist, "Madonna");
        assert_eq!(m.title, "Vogue");
        assert_eq!(m.confidence, 0.7);
    }

    #[test]
    fn test_blank_tags_use_filename_wholesale() {
        let tags = TagData {
            artist: Some("  ".into()),
            album: Some("Ignored".into()),
            ..Default::default()
        };
        let m = parser().parse("Madonna - Vogue.mp3", Some(&tags));
        assert_eq!(m.source, ParseSource::Filename);
        assert_eq!(m.album, "");
    }

    #[test]
    fn test_parse_with_outcomes() {
        let outcome = parser().parse_with("Madonna - Vogue.mp3", &NoTags);
        assert!(matches!(outcome, ParseOutcome::FilenameOnly(_)));
        assert!(outcome.used_fallback());

        let outcome = parser().parse_with("Madonna - Vogue.mp3", &FailingTags);
        match &outcome {
            ParseOutcome::TagsFailed { metadata, error } => {
                assert_eq!(metadata.artist, "Madonna");
                assert_eq!(error.reason, "corrupt frame");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let mut tags = HashMap::new();
        tags.insert(
            "a.mp3".to_string(),
            TagData {
                artist: Some("X".into()),
                title: Some("Y".into()),
                ..Default::default()
            },
        );
        let outcome = parser().parse_with("a.mp3", &tags);
        assert!(matches!(outcome, ParseOutcome::Tagged(_)));
        assert_eq!(outcome.into_metadata().artist, "X");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2024"), 2024);
        assert_eq!(parse_year("2024-01-15"), 2024);
        assert_eq!(parse_year("abcd"), 0);
        assert_eq!(parse_year(""), 0);
        assert_eq!(parse_year("85"), 85);
    }

    #[test]
    fn test_is_track_number() {
        assert!(is_track_number("01"));
        assert!(is_track_number("1."));
        assert!(is_track_number("123"));
        assert!(!is_track_number("1234"));
        assert!(!is_track_number("A1"));
        assert!(!is_track_number(""));
    }
}
