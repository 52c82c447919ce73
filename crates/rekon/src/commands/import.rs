use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use rekon_core::import::apply_conflict_policy;
use rekon_core::parser::{NoTags, TagSource};
use rekon_core::{
    ConflictPolicy, ImportCandidate, ImportResult, ImportService, ImportStatus, ImportSummary,
    NewRecord, UserDecision,
};

use crate::commands::Session;
use crate::scanner::walk::expand_paths;

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Files and directories to import
    pub paths: Vec<String>,
    /// Decision for conflicts that have none yet
    pub on_conflict: ConflictPolicy,
    pub dry_run: bool,
    /// Candidates saved by `preview --save`, used instead of `paths`
    pub candidates: Option<PathBuf>,
}

/// What executing one candidate would do
#[derive(Debug, Clone, Serialize)]
pub struct PlannedImport {
    pub file_path: String,
    pub status: ImportStatus,
    pub decision: Option<UserDecision>,
    /// Record a create would insert
    pub record: Option<NewRecord>,
    /// Record a merge would repoint
    pub merge_into: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImportOutcome {
    DryRun { plan: Vec<PlannedImport> },
    Executed { summary: ImportSummary },
}

/// Classify files against the inventory without writing anything
pub fn preview(session: &Session, paths: &[String]) -> Result<Vec<ImportCandidate>> {
    let files = expand_paths(paths);
    info!("Previewing {} audio files", files.len());

    let tags = session.tag_source()?;
    let mut service =
        ImportService::new(&session.ctx, &session.store, &session.artists, tags.as_ref());
    let candidates = service
        .preview(&files, None::<fn(usize, usize)>)
        .context("Preview failed")?;
    Ok(candidates)
}

/// Preview (or load saved candidates), settle conflicts and execute
pub fn import(session: &Session, options: &ImportOptions) -> Result<ImportOutcome> {
    let (mut candidates, tags): (Vec<ImportCandidate>, Box<dyn TagSource>) =
        match &options.candidates {
            Some(file) => (load_candidates(file)?, Box::new(NoTags) as Box<dyn TagSource>),
            None => (preview(session, &options.paths)?, session.tag_source()?),
        };

    let decided = apply_conflict_policy(&mut candidates, options.on_conflict);
    if decided > 0 {
        info!("Applied {:?} to {} conflicts", options.on_conflict, decided);
    }

    let mut service =
        ImportService::new(&session.ctx, &session.store, &session.artists, tags.as_ref());
    if options.dry_run {
        let plan = candidates.iter().map(|c| plan_for(&service, c)).collect();
        return Ok(ImportOutcome::DryRun { plan });
    }

    let summary = service.execute(
        candidates,
        Some(|current: usize, total: usize, result: &ImportResult| {
            if current % 100 == 0 || current == total {
                info!("Imported {}/{} ({:?})", current, total, result.action);
            }
        }),
    );
    Ok(ImportOutcome::Executed { summary })
}

fn plan_for(service: &ImportService<'_>, candidate: &ImportCandidate) -> PlannedImport {
    let decision = match candidate.status {
        ImportStatus::Conflict => Some(candidate.decision()),
        _ => None,
    };
    let creates = match candidate.status {
        ImportStatus::New => true,
        ImportStatus::Conflict => decision == Some(UserDecision::Import),
        ImportStatus::Duplicate => false,
    };
    PlannedImport {
        file_path: candidate.file_path.clone(),
        status: candidate.status,
        decision,
        record: creates.then(|| service.insertion_payload(candidate)),
        merge_into: match decision {
            Some(UserDecision::Merge) => candidate.existing_id,
            _ => None,
        },
    }
}

pub fn save_candidates(path: &Path, candidates: &[ImportCandidate]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(candidates)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} candidates to {}", candidates.len(), path.display());
    Ok(())
}

pub fn load_candidates(path: &Path) -> Result<Vec<ImportCandidate>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let candidates: Vec<ImportCandidate> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a candidate list", path.display()))?;
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::songs;
    use rekon_core::ImportAction;

    fn library() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Band - Song.mp3");
        fs::write(&file, b"not really audio").unwrap();
        (dir, file.to_string_lossy().to_string())
    }

    fn session() -> Session {
        Session::in_memory(AppConfig::default()).unwrap()
    }

    fn executed(outcome: ImportOutcome) -> ImportSummary {
        match outcome {
            ImportOutcome::Executed { summary } => summary,
            other => panic!("expected execution, got {:?}", other),
        }
    }

    #[test]
    fn test_import_then_duplicate() {
        let (dir, file) = library();
        let session = session();
        let options = ImportOptions {
            paths: vec![dir.path().to_string_lossy().to_string()],
            ..Default::default()
        };

        let summary = executed(import(&session, &options).unwrap());
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.artists_created, 1);

        let stored = session
            .db
            .with_conn(|conn| songs::get_song_by_id(conn, summary.results[0].record_id.unwrap()))
            .unwrap()
            .unwrap();
        assert_eq!(stored.artist(), "Band");
        assert_eq!(stored.title(), "Song");
        assert_eq!(stored.path(), file);

        let again = preview(&session, &[file]).unwrap();
        assert_eq!(again[0].status, ImportStatus::Duplicate);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_dir, file) = library();
        let session = session();
        let options = ImportOptions {
            paths: vec![file.clone()],
            dry_run: true,
            ..Default::default()
        };

        let ImportOutcome::DryRun { plan } = import(&session, &options).unwrap() else {
            panic!("expected a dry run");
        };
        assert_eq!(plan.len(), 1);
        let record = plan[0].record.as_ref().unwrap();
        assert_eq!(record.path, file);
        assert_eq!(record.artist_id, -1);
        assert_eq!(session.db.with_conn(songs::count_songs).unwrap(), 0);
    }

    #[test]
    fn test_merge_policy_repoints_existing_record() {
        let (_dir, file) = library();
        let session = session();
        let existing = NewRecord {
            artist: "Band".into(),
            title: "Song".into(),
            path: "z:\\old\\Band - Song.mp3".into(),
            ..Default::default()
        };
        let id = session
            .db
            .with_conn(|conn| songs::add_song(conn, &existing))
            .unwrap();

        let options = ImportOptions {
            paths: vec![file.clone()],
            on_conflict: ConflictPolicy::Merge,
            ..Default::default()
        };
        let summary = executed(import(&session, &options).unwrap());
        assert_eq!(summary.results[0].action, ImportAction::Merged);
        assert_eq!(summary.conflicts_resolved, 1);

        let stored = session
            .db
            .with_conn(|conn| songs::get_song_by_id(conn, id))
            .unwrap()
            .unwrap();
        assert_eq!(stored.path(), file);
        assert_eq!(session.db.with_conn(songs::count_songs).unwrap(), 1);
    }

    #[test]
    fn test_saved_candidates_round_trip_into_import() {
        let (dir, file) = library();
        let session = session();
        let saved = dir.path().join("out").join("candidates.json");

        let candidates = preview(&session, &[file]).unwrap();
        save_candidates(&saved, &candidates).unwrap();

        let options = ImportOptions {
            candidates: Some(saved),
            ..Default::default()
        };
        let summary = executed(import(&session, &options).unwrap());
        assert_eq!(summary.successful, 1);
    }

    #[test]
    fn test_load_candidates_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert!(load_candidates(&path).is_err());
    }
}
