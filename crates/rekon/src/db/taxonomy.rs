//! Genre, decade and tempo lookup tables (`snCat1`, `snCat2`, `snCat3`).

use rusqlite::{Connection, params};

use rekon_core::Taxonomy;

use crate::db::{DbError, DbResult};

/// One of the category lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Genre,
    Decade,
    Tempo,
}

impl Category {
    pub fn table(self) -> &'static str {
        match self {
            Category::Genre => "snCat1",
            Category::Decade => "snCat2",
            Category::Tempo => "snCat3",
        }
    }
}

/// All (id, name) rows of a category, ordered by id
pub fn get_entries(conn: &Connection, category: Category) -> DbResult<Vec<(i64, String)>> {
    let sql = format!(
        "SELECT AUID, fldMusicType FROM {} ORDER BY AUID",
        category.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get::<_, Option<String>>(1)?.unwrap_or_default()))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Add a category entry unless one with the same name (ignoring case)
/// exists; returns the entry's id
pub fn add_entry(conn: &Connection, category: Category, name: &str) -> DbResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::Constraint(format!(
            "{} name is empty",
            category.table()
        )));
    }

    let existing = conn.query_row(
        &format!(
            "SELECT AUID FROM {} WHERE lower(trim(fldMusicType)) = lower(?) ORDER BY AUID LIMIT 1",
            category.table()
        ),
        [name],
        |row| row.get::<_, i64>(0),
    );
    match existing {
        Ok(id) => return Ok(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {}
        Err(e) => return Err(e.into()),
    }

    conn.execute(
        &format!("INSERT INTO {} (fldMusicType) VALUES (?)", category.table()),
        params![name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Build the genre/decade name maps used by the reconciler
pub fn load_taxonomy(conn: &Connection) -> DbResult<Taxonomy> {
    let genres = get_entries(conn, Category::Genre)?;
    let decades = get_entries(conn, Category::Decade)?;
    Ok(Taxonomy::from_rows(genres, decades))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{create_tables, seed_decades};

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        seed_decades(&conn).unwrap();
        conn
    }

    #[test]
    fn test_add_entry_is_idempotent() {
        let conn = setup_test_db();
        let rock = add_entry(&conn, Category::Genre, "Rock").unwrap();
        assert_eq!(add_entry(&conn, Category::Genre, " rock ").unwrap(), rock);
        assert_eq!(get_entries(&conn, Category::Genre).unwrap().len(), 1);
        assert!(add_entry(&conn, Category::Tempo, "").is_err());
    }

    #[test]
    fn test_load_taxonomy() {
        let conn = setup_test_db();
        let pop = add_entry(&conn, Category::Genre, "Pop").unwrap();

        let taxonomy = load_taxonomy(&conn).unwrap();
        assert_eq!(taxonomy.genre_id("pop"), Some(pop));
        assert_eq!(taxonomy.decade_count(), 13);
        assert!(taxonomy.decade_id("1980's").is_some());
    }
}
