// End-to-end run against a SQLite file: preview, import, audit
use std::fs;
use std::path::{Path, PathBuf};

use rekon_core::{ConflictPolicy, ImportAction, ImportStatus, NewRecord};
use rekon_lib::commands::{self, ImportOptions, ImportOutcome, Session};
use rekon_lib::config::AppConfig;
use rekon_lib::db::songs;

/// Library with two audio files and a cover image
fn make_library(root: &Path) -> (String, String) {
    let sub = root.join("Sub");
    fs::create_dir_all(&sub).unwrap();
    let bicycle = root.join("Queen - Bicycle.mp3");
    let tune = sub.join("Other - Tune.flac");
    fs::write(&bicycle, b"not really audio").unwrap();
    fs::write(&tune, b"not really audio").unwrap();
    fs::write(root.join("cover.jpg"), b"x").unwrap();
    (
        bicycle.to_string_lossy().to_string(),
        tune.to_string_lossy().to_string(),
    )
}

fn config(db: PathBuf, library: &Path) -> AppConfig {
    AppConfig {
        database: db,
        base_songs_path: Some(library.to_path_buf()),
        ..Default::default()
    }
}

fn seed(session: &Session, artist: &str, title: &str, path: &str) -> i64 {
    let record = NewRecord {
        artist: artist.into(),
        title: title.into(),
        path: path.into(),
        ..Default::default()
    };
    session
        .db
        .with_conn(|conn| songs::add_song(conn, &record))
        .unwrap()
}

#[test]
fn test_preview_import_audit() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("library");
    let (bicycle, tune) = make_library(&library);
    let db_path = dir.path().join("data").join("inventory.db");

    let session = Session::open(config(db_path.clone(), &library)).unwrap();
    let conflict_id = seed(&session, "Queen", "Bicycle", "z:\\old\\Queen - Bicycle.mp3");
    let gone_id = seed(&session, "Lost", "Song", "/nowhere/Lost - Song.mp3");

    // Preview classifies without writing
    let library_arg = vec![library.to_string_lossy().to_string()];
    let candidates = commands::preview(&session, &library_arg).unwrap();
    assert_eq!(candidates.len(), 2);
    let by_path = |p: &str| candidates.iter().find(|c| c.file_path == p).unwrap();
    assert_eq!(by_path(&bicycle).status, ImportStatus::Conflict);
    assert_eq!(by_path(&bicycle).existing_id, Some(conflict_id));
    assert_eq!(by_path(&tune).status, ImportStatus::New);
    assert_eq!(session.db.with_conn(songs::count_songs).unwrap(), 2);

    // Default policy skips the conflict and imports the new file
    let options = ImportOptions {
        paths: library_arg.clone(),
        ..Default::default()
    };
    let ImportOutcome::Executed { summary } = commands::import(&session, &options).unwrap() else {
        panic!("expected execution");
    };
    assert_eq!(summary.total, 2);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.artists_created, 1);
    assert!(!summary.has_errors());

    // Merging repoints the conflicting record; the imported file is now a duplicate
    let options = ImportOptions {
        paths: library_arg,
        on_conflict: ConflictPolicy::Merge,
        ..Default::default()
    };
    let ImportOutcome::Executed { summary } = commands::import(&session, &options).unwrap() else {
        panic!("expected execution");
    };
    let action_for = |p: &str| {
        summary
            .results
            .iter()
            .find(|r| r.file_path == p)
            .map(|r| r.action)
    };
    assert_eq!(action_for(&bicycle), Some(ImportAction::Merged));
    assert_eq!(action_for(&tune), Some(ImportAction::Skipped));
    drop(session);

    // A fresh session sees the persisted state
    let session = Session::open(config(db_path, &library)).unwrap();
    assert_eq!(session.db.with_conn(songs::count_songs).unwrap(), 3);

    let report = commands::audit(&session).unwrap();
    assert!(report.complete);
    assert_eq!(report.total, 3);
    assert_eq!(report.found, 2);
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].id, gone_id);
    assert_eq!(report.problem_count(), 1);

    assert!(commands::untracked(&session).unwrap().is_empty());
}

#[test]
fn test_audit_finds_moved_file_in_snapshot_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("songs_dir.txt");
    fs::write(
        &log,
        "\r\n    Directory: Z:\\Archive\\1985\r\n\r\n\
         Mode                 LastWriteTime         Length Name\r\n\
         ----                 -------------         ------ ----\r\n\
         d-----          1/2/2020   3:04 PM                Extras\r\n\
         -a----          1/2/2020   3:04 PM        4194304 Queen - Bicycle.mp3\r\n",
    )
    .unwrap();

    let mut config = config(dir.path().join("inventory.db"), dir.path());
    config.snapshot_log = Some(log);
    config.reconcile.drive_map.insert("b:".into(), "z:".into());

    let session = Session::open(config).unwrap();
    seed(&session, "Queen", "Bicycle", "b:\\songs\\Queen - Bicycle.mp3");

    let report = commands::audit(&session).unwrap();
    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.moved[0].resolved_path, "z:\\songs\\Queen - Bicycle.mp3");
    assert_eq!(
        report.moved[0].candidates,
        vec!["z:\\archive\\1985\\queen - bicycle.mp3"]
    );
}
