//! Text and path canonicalization.
//!
//! Every matching step (duplicate paths, artist+title conflicts, audit
//! lookups) goes through these functions so that the same input always
//! lands on the same key. All of them are pure and idempotent.

/// Canonical separator for stored inventory paths
pub const PATH_SEPARATOR: char = '\\';

/// Normalize free text for duplicate comparison.
///
/// Lowercases, trims and collapses whitespace runs to a single space.
/// Hyphens and punctuation are kept, so "AC-DC" and "AC DC" stay distinct
/// and "P!nk" is not folded into "Pnk".
pub fn normalize_for_comparison<'a>(text: impl Into<Option<&'a str>>) -> String {
    let Some(text) = text.into() else {
        return String::new();
    };
    collapse_whitespace(&text.to_lowercase())
}

/// Normalize a file path for comparison: lowercase, forward slashes turned
/// into the canonical separator, surrounding whitespace trimmed.
pub fn normalize_path<'a>(path: impl Into<Option<&'a str>>) -> String {
    let Some(path) = path.into() else {
        return String::new();
    };
    path.to_lowercase()
        .replace('/', &PATH_SEPARATOR.to_string())
        .trim()
        .to_string()
}

/// Build the conflict key for an artist/title pair.
pub fn artist_title_key(artist: &str, title: &str) -> String {
    format!(
        "{}|||{}",
        normalize_for_comparison(artist),
        normalize_for_comparison(title)
    )
}

/// Key used to find a file again after it moved: the bare file name,
/// lowercased, with everything but letters and digits removed.
pub fn file_name_key(path: &str) -> String {
    file_name(path)
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Last component of a path, accepting both separators.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Trim and collapse internal whitespace runs to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Path normalization used by the audit pass.
///
/// Starts from [`normalize_path`] and optionally drops the drive letter,
/// repairs doubled extensions (`song.mp3.mp3`) and collapses whitespace,
/// which is how stale listings and hand-edited inventory rows usually differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathNormalizer {
    pub ignore_drive_letters: bool,
}

impl PathNormalizer {
    pub fn new(ignore_drive_letters: bool) -> Self {
        Self {
            ignore_drive_letters,
        }
    }

    pub fn normalize(&self, path: &str) -> String {
        let mut p = normalize_path(path);
        if p.is_empty() {
            return p;
        }

        if self.ignore_drive_letters && has_drive_prefix(&p) {
            p = p[2..].to_string();
        }

        repair_doubled_extension(&collapse_whitespace(&p))
    }
}

/// Drive prefix: ASCII letter and colon, alone or followed by the separator
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == PATH_SEPARATOR as u8)
}

fn repair_doubled_extension(path: &str) -> String {
    let mut out = path.to_string();
    loop {
        let name = file_name(&out);
        let Some((stem, ext)) = name.rsplit_once('.') else {
            return out;
        };
        if ext.is_empty() || !stem.ends_with(&format!(".{ext}")) {
            return out;
        }
        out.truncate(out.len() - ext.len() - 1);
    }
}
