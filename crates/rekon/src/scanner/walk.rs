//! Live filesystem access: presence checks and directory walks.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use rekon_core::FileSource;

use crate::scanner::is_audio_file;

/// Audio files below `root`, recursively, in file name order
pub fn walk_audio_files(root: &Path) -> Vec<String> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| entry.path().to_string_lossy().to_string())
        .collect()
}

/// Expand command-line paths: audio files are kept, directories are walked.
///
/// Paths that do not exist or are not audio files are logged and dropped.
pub fn expand_paths(paths: &[String]) -> Vec<String> {
    let mut files = Vec::new();
    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_dir() {
            let found = walk_audio_files(path);
            debug!("{}: {} audio files", path_str, found.len());
            files.extend(found);
        } else if path.is_file() {
            if is_audio_file(path) {
                files.push(path_str.clone());
            } else {
                debug!("Skipping non-audio file {}", path_str);
            }
        } else {
            warn!("Path not found: {}", path_str);
        }
    }
    files
}

/// The mounted library, optionally rooted for listing
#[derive(Debug, Clone, Default)]
pub struct LiveFileSystem {
    root: Option<PathBuf>,
}

impl LiveFileSystem {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl FileSource for LiveFileSystem {
    fn exists(&self, path: &str) -> bool {
        !path.is_empty() && Path::new(path).is_file()
    }

    fn all_paths(&self) -> Vec<String> {
        match &self.root {
            Some(root) if root.is_dir() => walk_audio_files(root),
            Some(root) => {
                warn!("Library root {} is not reachable", root.display());
                Vec::new()
            }
            None => {
                warn!("No library root configured, nothing to list");
                Vec::new()
            }
        }
    }
}
