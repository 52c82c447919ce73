//! Metadata snapshot: tags of a whole library, scanned in parallel and
//! cached as JSON so later runs can work without the share mounted.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use rekon_core::normalize::normalize_path;
use rekon_core::parser::{TagData, TagReadError, TagSource};
use rekon_core::FileSource;

use crate::scanner::tags::read_tags;
use crate::scanner::walk::walk_audio_files;
use crate::scanner::{ScanError, ScanResult};

/// Log a progress line every this many files
const PROGRESS_EVERY: usize = 1000;

/// Tag data keyed by normalized (lowercase) path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub generated_at: Option<String>,
    entries: BTreeMap<String, TagData>,
}

impl MetadataSnapshot {
    /// Scan every audio file under `folders` and collect its tags.
    ///
    /// # Arguments
    /// * `folders` - Library folders; unreachable ones are skipped with a warning
    /// * `workers` - Thread count, rayon's default when `None`
    /// * `progress_fn` - Optional progress callback (completed_count, total)
    ///
    /// Files whose tags cannot be read are left out.
    pub fn generate<F>(
        folders: &[String],
        workers: Option<usize>,
        progress_fn: Option<F>,
    ) -> ScanResult<Self>
    where
        F: Fn(usize, usize) + Sync,
    {
        let mut files = Vec::new();
        for folder in folders {
            let path = Path::new(folder);
            if path.is_dir() {
                info!("Indexing files in {}", folder);
                files.extend(walk_audio_files(path));
            } else {
                warn!("Skipping unreachable folder {}", folder);
            }
        }

        let total = files.len();
        info!("Found {} audio files, starting metadata scan", total);

        let completed = Arc::new(AtomicUsize::new(0));
        let scan = || -> Vec<(String, TagData)> {
            files
                .par_iter()
                .filter_map(|filepath| {
                    let result = read_tags(filepath);
                    let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % PROGRESS_EVERY == 0 {
                        info!("Scanned {}/{} files", count, total);
                    }
                    if let Some(ref f) = progress_fn {
                        f(count, total);
                    }
                    match result {
                        Ok(tags) => Some((normalize_path(filepath.as_str()), tags)),
                        Err(e) => {
                            debug!("Skipping {}: {}", filepath, e);
                            None
                        }
                    }
                })
                .collect()
        };

        let scanned = match workers {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ScanError::Metadata(format!("Failed to start workers: {}", e)))?
                .install(scan),
            None => scan(),
        };

        let snapshot = Self {
            generated_at: Some(chrono::Local::now().to_rfc3339()),
            entries: scanned.into_iter().collect(),
        };
        info!("Finished, snapshot contains {} files", snapshot.len());
        Ok(snapshot)
    }

    /// Load a snapshot written by [`MetadataSnapshot::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScanError::PathNotFound(path.display().to_string()));
        }
        let snapshot: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        info!("Loaded {} entries from metadata snapshot", snapshot.len());
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ScanResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved metadata snapshot to {}", path.display());
        Ok(())
    }

    pub fn insert(&mut self, path: &str, tags: TagData) {
        self.entries.insert(normalize_path(path), tags);
    }

    pub fn get(&self, path: &str) -> Option<&TagData> {
        self.entries.get(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Unknown paths have no tags, so parsing falls back to the file name
impl TagSource for MetadataSnapshot {
    fn read(&self, path: &str) -> Result<TagData, TagReadError> {
        Ok(self.get(path).cloned().unwrap_or_default())
    }
}

impl FileSource for MetadataSnapshot {
    fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    fn all_paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(artist: &str, title: &str) -> TagData {
        TagData {
            artist: Some(artist.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_ignores_case_and_separators() {
        let mut snapshot = MetadataSnapshot::default();
        snapshot.insert("Z:\\Songs\\A.mp3", tags("A", "B"));

        assert_eq!(snapshot.get("z:/songs/a.MP3"), Some(&tags("A", "B")));
        assert!(snapshot.exists("Z:\\SONGS\\A.mp3"));
        assert_eq!(snapshot.all_paths(), vec!["z:\\songs\\a.mp3"]);
        assert_eq!(snapshot.read("z:\\other.mp3").unwrap(), TagData::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("metadata_snapshot.json");

        let mut snapshot = MetadataSnapshot::default();
        snapshot.insert("z:\\a.mp3", tags("A", "B"));
        snapshot.save(&path).unwrap();

        let loaded = MetadataSnapshot::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("Z:\\A.mp3").and_then(|t| t.title.clone()), Some("B".into()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = MetadataSnapshot::load(dir.path().join("nope.json"));
        assert!(matches!(result, Err(ScanError::PathNotFound(_))));
    }

    #[test]
    fn test_generate_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.mp3"), b"not audio").unwrap();
        let folders = vec![
            dir.path().to_string_lossy().to_string(),
            "/no/such/folder".to_string(),
        ];

        let calls = AtomicUsize::new(0);
        let snapshot = MetadataSnapshot::generate(
            &folders,
            Some(2),
            Some(|_: usize, total: usize| {
                assert_eq!(total, 1);
                calls.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .unwrap();

        assert!(snapshot.is_empty());
        assert!(snapshot.generated_at.is_some());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
