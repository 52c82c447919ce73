use anyhow::Result;
use serde::Serialize;

use crate::commands::Session;
use crate::db::taxonomy::{Category, get_entries};
use crate::db::{artists, songs};

/// Row counts of a freshly opened inventory
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub database: String,
    pub songs: i64,
    pub artists: usize,
    pub genres: usize,
    pub decades: usize,
}

/// Create or upgrade the schema and report what the inventory holds.
///
/// Opening the session already ran the migrations; this only counts.
pub fn init(session: &Session) -> Result<InitReport> {
    let report = session.db.with_conn(|conn| {
        Ok(InitReport {
            database: session.config.database.display().to_string(),
            songs: songs::count_songs(conn)?,
            artists: artists::get_all_artists(conn)?.len(),
            genres: get_entries(conn, Category::Genre)?.len(),
            decades: get_entries(conn, Category::Decade)?.len(),
        })
    })?;
    Ok(report)
}
