//! Artist table operations (`snArtists`).

use rusqlite::{Connection, params};

use crate::db::{DbError, DbResult};

/// Id of the artist with exactly this name (lowest id when repeated)
pub fn find_artist_by_name(conn: &Connection, name: &str) -> DbResult<Option<i64>> {
    let result = conn.query_row(
        "SELECT AUID FROM snArtists WHERE fldName = ? ORDER BY AUID LIMIT 1",
        [name],
        |row| row.get(0),
    );
    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert an artist and return its id
pub fn add_artist(conn: &Connection, name: &str) -> DbResult<i64> {
    if name.trim().is_empty() {
        return Err(DbError::Constraint("artist name is empty".into()));
    }
    conn.execute("INSERT INTO snArtists (fldName) VALUES (?)", params![name])?;
    Ok(conn.last_insert_rowid())
}

/// Id of the named artist, inserting it when absent
///
/// # Returns
/// The id and whether the artist was created
pub fn get_or_create_artist(conn: &Connection, name: &str) -> DbResult<(i64, bool)> {
    match find_artist_by_name(conn, name)? {
        Some(id) => Ok((id, false)),
        None => Ok((add_artist(conn, name)?, true)),
    }
}

/// All artists as (id, name), ordered by name
pub fn get_all_artists(conn: &Connection) -> DbResult<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT AUID, fldName FROM snArtists ORDER BY fldName")?;
    let artists = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(artists)
}
