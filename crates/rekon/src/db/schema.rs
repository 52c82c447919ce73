//! Database schema definitions and migrations.
//!
//! Table and column names follow the playout system's own database so an
//! exported inventory can be opened directly.

use rusqlite::Connection;
use tracing::info;

use crate::db::DbResult;

/// First and last decade seeded into `snCat2`
pub const DECADE_RANGE: (i64, i64) = (1900, 2020);

/// SQL statements for creating all database tables
pub const CREATE_TABLES: &[(&str, &str)] = &[
    (
        "snDatabase",
        "CREATE TABLE IF NOT EXISTS snDatabase (
            AUID INTEGER PRIMARY KEY AUTOINCREMENT,
            fldArtistCode INTEGER NOT NULL DEFAULT 0,
            fldArtistName TEXT,
            fldTitle TEXT,
            fldFilename TEXT,
            fldDuration REAL DEFAULT 0,
            fldAlbum TEXT,
            fldYear INTEGER DEFAULT 0,
            fldComposer TEXT,
            fldLabel TEXT,
            fldCDKey TEXT,
            fldCat1a INTEGER DEFAULT 0,
            fldCat1b INTEGER DEFAULT 0,
            fldCat1c INTEGER DEFAULT 0,
            fldCat2 INTEGER DEFAULT 0,
            fldCat3 INTEGER DEFAULT 0,
            fldEnabled INTEGER DEFAULT 1,
            fldEnabledAuto INTEGER DEFAULT 1,
            fldVocalPresent INTEGER DEFAULT 0,
            fldPriority INTEGER DEFAULT 5,
            fldIntroPos REAL DEFAULT 0,
            fldMixPos REAL DEFAULT 0,
            fldFadeDur REAL DEFAULT 1,
            fldFadePos REAL DEFAULT 0,
            fldStartPos REAL DEFAULT 0,
            fldFadeInDur REAL DEFAULT 0,
            fldVolume INTEGER DEFAULT 100,
            fldBroadcasts INTEGER DEFAULT 0,
            fldVoteCount INTEGER DEFAULT 1,
            fldNoRDS INTEGER DEFAULT 0,
            fldDoNotAutoAlter INTEGER DEFAULT 0
        )",
    ),
    (
        "snArtists",
        "CREATE TABLE IF NOT EXISTS snArtists (
            AUID INTEGER PRIMARY KEY AUTOINCREMENT,
            fldName TEXT NOT NULL
        )",
    ),
    (
        "snCat1",
        "CREATE TABLE IF NOT EXISTS snCat1 (
            AUID INTEGER PRIMARY KEY AUTOINCREMENT,
            fldMusicType TEXT NOT NULL
        )",
    ),
    (
        "snCat2",
        "CREATE TABLE IF NOT EXISTS snCat2 (
            AUID INTEGER PRIMARY KEY AUTOINCREMENT,
            fldMusicType TEXT NOT NULL
        )",
    ),
    (
        "snCat3",
        "CREATE TABLE IF NOT EXISTS snCat3 (
            AUID INTEGER PRIMARY KEY AUTOINCREMENT,
            fldMusicType TEXT NOT NULL
        )",
    ),
];

/// Create all database tables
pub fn create_tables(conn: &Connection) -> DbResult<()> {
    for (_, sql) in CREATE_TABLES {
        conn.execute(sql, [])?;
    }
    Ok(())
}

/// Run database migrations for schema updates
///
/// Exports from older playout versions lack some columns; each step is
/// skipped when already applied.
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    let song_columns = get_table_columns(conn, "snDatabase")?;

    if !song_columns.contains(&"fldCDKey".to_string()) {
        info!("[migration] Adding fldCDKey column to snDatabase");
        conn.execute("ALTER TABLE snDatabase ADD COLUMN fldCDKey TEXT", [])?;
    }

    if !song_columns.contains(&"fldDoNotAutoAlter".to_string()) {
        info!("[migration] Adding fldDoNotAutoAlter column to snDatabase");
        conn.execute(
            "ALTER TABLE snDatabase ADD COLUMN fldDoNotAutoAlter INTEGER DEFAULT 0",
            [],
        )?;
    }

    if !song_columns.contains(&"fldDateAdded".to_string()) {
        info!("[migration] Adding fldDateAdded column to snDatabase");
        conn.execute("ALTER TABLE snDatabase ADD COLUMN fldDateAdded TEXT", [])?;
    }

    if !index_exists(conn, "idx_songs_filename")? {
        info!("[migration] Creating filename index on snDatabase");
        conn.execute(
            "CREATE INDEX idx_songs_filename ON snDatabase(fldFilename COLLATE NOCASE)",
            [],
        )?;
    }

    if !index_exists(conn, "idx_songs_artist_title")? {
        info!("[migration] Creating artist/title index on snDatabase");
        conn.execute(
            "CREATE INDEX idx_songs_artist_title ON snDatabase(fldArtistName, fldTitle)",
            [],
        )?;
    }

    if !index_exists(conn, "idx_artists_name")? {
        info!("[migration] Creating name index on snArtists");
        conn.execute("CREATE INDEX idx_artists_name ON snArtists(fldName)", [])?;
    }

    Ok(())
}

/// Fill `snCat2` with "1900's" .. "2020's" when the table is empty
pub fn seed_decades(conn: &Connection) -> DbResult<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM snCat2", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let (first, last) = DECADE_RANGE;
    let mut stmt = conn.prepare("INSERT INTO snCat2 (fldMusicType) VALUES (?)")?;
    for decade in (first..=last).step_by(10) {
        stmt.execute([format!("{decade}'s")])?;
    }
    info!("Seeded {} decades", (last - first) / 10 + 1);
    Ok(())
}

/// Get column names for a table
fn get_table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(columns)
}

/// Check if an index exists
fn index_exists(conn: &Connection, index_name: &str) -> DbResult<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?",
        [index_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
