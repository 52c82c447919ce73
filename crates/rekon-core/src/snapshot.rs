//! Virtual file listings.
//!
//! When the library share is not mounted, file presence comes from a
//! listing captured earlier on the server (a PowerShell `dir` redirect or a
//! flat list of full paths). [`VirtualSnapshot`] parses such a listing into a
//! set of normalized paths and answers the same questions as a live walk.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::normalize::{PATH_SEPARATOR, normalize_path};

/// Matches "    Directory: B:\songs"
static DIRECTORY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*Directory:\s*(.*)$").unwrap());

/// Matches "-a----  29/10/2025  14:28  5483047 Filename.mp3"; the time may
/// carry an AM/PM suffix depending on the server locale
static FILE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([dlarhs-]{5,6})\s+\S+\s+\S+(?:\s+[AaPp][Mm])?\s+\d+\s+(.+)$").unwrap()
});

/// Matches a directory row, which has no length column
static DIRECTORY_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^d[larhs-]{4,5}\s+").unwrap());

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Presence oracle over a set of files
pub trait FileSource {
    fn exists(&self, path: &str) -> bool;

    /// Every known file path
    fn all_paths(&self) -> Vec<String>;
}

/// Files recorded in a captured listing, keyed by [`normalize_path`]
#[derive(Debug, Clone, Default)]
pub struct VirtualSnapshot {
    files: BTreeSet<String>,
}

impl VirtualSnapshot {
    /// Load and parse a listing file (UTF-8 or UTF-16 with BOM)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let snapshot = Self::parse(&decode(&bytes));
        info!(
            "Loaded {} snapshot entries from {}",
            snapshot.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Parse listing text.
    ///
    /// Table rows are joined to the most recent `Directory:` header; rows
    /// seen before any header are dropped. Lines that are absolute paths on
    /// their own are taken as is. Directory rows and anything else are ignored.
    pub fn parse(text: &str) -> Self {
        let mut files = BTreeSet::new();
        let mut current_dir: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(dir) = capture(&DIRECTORY_HEADER, line, 1) {
                current_dir = Some(dir.trim().to_string());
                continue;
            }

            if DIRECTORY_ROW.is_match(line) {
                continue;
            }

            if let Some(name) = capture(&FILE_ROW, line, 2) {
                match &current_dir {
                    Some(dir) if !dir.is_empty() => {
                        files.insert(normalize_path(join(dir, name.trim()).as_str()));
                    }
                    _ => debug!("Snapshot row without directory header: {}", line),
                }
                continue;
            }

            if is_absolute(line) {
                files.insert(normalize_path(line));
            }
        }

        Self { files }
    }

    /// Snapshot of explicit paths
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            files: paths
                .into_iter()
                .map(|p| normalize_path(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }
}

impl FileSource for VirtualSnapshot {
    fn exists(&self, path: &str) -> bool {
        !path.is_empty() && self.files.contains(&normalize_path(path))
    }

    fn all_paths(&self) -> Vec<String> {
        self.files.iter().cloned().collect()
    }
}

/// Decode listing bytes: UTF-16 LE/BE when a BOM says so, UTF-8 otherwise
pub fn decode(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], word: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| word([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn capture<'a>(re: &Regex, line: &'a str, group: usize) -> Option<&'a str> {
    re.captures(line)?.get(group).map(|m| m.as_str())
}

fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches(['\\', '/']);
    format!("{dir}{PATH_SEPARATOR}{name}")
}

fn is_absolute(line: &str) -> bool {
    let bytes = line.as_bytes();
    line.starts_with('/')
        || line.starts_with("\\\\")
        || (bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'\\' || bytes[2] == b'/'))
}
