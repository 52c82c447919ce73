//! Tag reading using lofty.

use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::Path;

use rekon_core::parser::{TagData, TagReadError, TagSource};

use crate::scanner::{ScanError, ScanResult};

/// Read artist/title/album/date/genre and friends from an audio file
pub fn read_tags(filepath: &str) -> ScanResult<TagData> {
    let path = Path::new(filepath);
    if !path.exists() {
        return Err(ScanError::PathNotFound(filepath.to_string()));
    }

    let tagged_file = Probe::open(path)
        .map_err(|e| ScanError::Metadata(format!("Failed to open file: {}", e)))?
        .read()
        .map_err(|e| ScanError::Metadata(format!("Failed to read file: {}", e)))?;

    let mut tags = TagData {
        duration: Some(tagged_file.properties().duration().as_secs_f64()),
        ..Default::default()
    };

    if let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    {
        let text = |key: ItemKey| tag.get_string(&key).map(|s| s.to_string());

        tags.title = tag.title().map(|s| s.to_string());
        tags.artist = tag.artist().map(|s| s.to_string());
        tags.album = tag.album().map(|s| s.to_string());
        tags.genre = tag.genre().map(|s| s.to_string());
        tags.date = text(ItemKey::RecordingDate).or_else(|| tag.year().map(|y| y.to_string()));
        tags.composer = text(ItemKey::Composer);
        tags.publisher = text(ItemKey::Publisher).or_else(|| text(ItemKey::Label));
        tags.isrc = text(ItemKey::Isrc);
    }

    Ok(tags)
}

/// [`TagSource`] reading the files themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagSource;

impl TagSource for LoftyTagSource {
    fn read(&self, path: &str) -> Result<TagData, TagReadError> {
        read_tags(path).map_err(|e| TagReadError::new(path, e))
    }
}
