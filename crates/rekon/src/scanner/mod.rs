//! Filesystem and tag access.
//!
//! - `tags`: lofty-backed tag reader
//! - `walk`: live directory walk and argument expansion
//! - `snapshot`: parallel tag scan cached as JSON for offline runs

pub mod snapshot;
pub mod tags;
pub mod walk;

use std::path::Path;
use thiserror::Error;

pub use snapshot::MetadataSnapshot;
pub use tags::LoftyTagSource;
pub use walk::LiveFileSystem;

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &[
    ".mp3", ".m4a", ".flac", ".ogg", ".wav", ".aac", ".wma", ".opus", ".ape", ".aiff",
];

/// Scanner error types
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata extraction error: {0}")]
    Metadata(String),

    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Check if a path has a supported audio extension
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = format!(".{}", ext.to_lowercase());
            AUDIO_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}
