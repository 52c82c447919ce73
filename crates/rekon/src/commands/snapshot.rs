use anyhow::{Context, Result};
use std::path::Path;

use crate::scanner::MetadataSnapshot;

/// Scan `folders` for tags and write the metadata snapshot to `out`.
///
/// Returns the number of files captured.
pub fn snapshot(folders: &[String], out: &Path, workers: Option<usize>) -> Result<usize> {
    let snapshot = MetadataSnapshot::generate(folders, workers, None::<fn(usize, usize)>)
        .context("Metadata scan failed")?;
    snapshot
        .save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(snapshot.len())
}
