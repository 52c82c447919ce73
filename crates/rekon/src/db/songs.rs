//! Song inventory operations (`snDatabase`).
//!
//! Columns are driven by the core field table so that reads, inserts and
//! updates stay in step with [`rekon_core::Field`].

use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};

use rekon_core::fields::{FIELDS, FieldKind, FieldSpec};
use rekon_core::inventory::RecordFilter;
use rekon_core::{Field, FieldValue, InventoryRecord, NewRecord};

use crate::db::{DbError, DbResult};

/// Comma-separated list of every mapped column
fn select_columns() -> String {
    FIELDS.iter().map(|spec| spec.column).collect::<Vec<_>>().join(", ")
}

/// Convert a column value into a field value of the field's kind.
///
/// Legacy exports store numbers as text now and then; those are parsed and
/// anything unreadable becomes NULL.
fn read_value(kind: FieldKind, value: Value) -> FieldValue {
    match (kind, value) {
        (_, Value::Null) | (_, Value::Blob(_)) => FieldValue::Null,
        (FieldKind::Text, Value::Text(s)) => FieldValue::Text(s),
        (FieldKind::Text, Value::Integer(i)) => FieldValue::Text(i.to_string()),
        (FieldKind::Text, Value::Real(f)) => FieldValue::Text(f.to_string()),
        (FieldKind::Int, Value::Integer(i)) => FieldValue::Int(i),
        (FieldKind::Int, Value::Real(f)) => FieldValue::Int(f as i64),
        (FieldKind::Int, Value::Text(s)) => s.trim().parse().map_or(FieldValue::Null, FieldValue::Int),
        (FieldKind::Real, Value::Integer(i)) => FieldValue::Real(i as f64),
        (FieldKind::Real, Value::Real(f)) => FieldValue::Real(f),
        (FieldKind::Real, Value::Text(s)) => {
            s.trim().parse().map_or(FieldValue::Null, FieldValue::Real)
        }
        (FieldKind::Bool, Value::Integer(i)) => FieldValue::Bool(i != 0),
        (FieldKind::Bool, Value::Real(f)) => FieldValue::Bool(f != 0.0),
        (FieldKind::Bool, Value::Text(s)) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "-1" => FieldValue::Bool(true),
            "0" | "false" | "no" => FieldValue::Bool(false),
            _ => FieldValue::Null,
        },
    }
}

fn to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Int(i) => Value::Integer(*i),
        FieldValue::Real(f) => Value::Real(*f),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
    }
}

fn read_field(row: &Row, spec: &FieldSpec) -> rusqlite::Result<FieldValue> {
    Ok(read_value(spec.kind, row.get::<_, Value>(spec.column)?))
}

/// Map a database row to an inventory record
fn row_to_record(row: &Row) -> rusqlite::Result<InventoryRecord> {
    let mut record = InventoryRecord {
        id: row.get(Field::Id.column())?,
        ..Default::default()
    };
    for spec in FIELDS.iter().filter(|spec| spec.field != Field::Id) {
        let value = read_field(row, spec)?;
        record.fields.set(spec.field, &value);
    }
    Ok(record)
}

/// Get songs matching an exact-match filter, ordered by id
pub fn get_songs(conn: &Connection, filter: &RecordFilter) -> DbResult<Vec<InventoryRecord>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    let conditions_for = [
        (Field::Artist, &filter.artist),
        (Field::Title, &filter.title),
        (Field::Path, &filter.path),
    ];
    for (field, wanted) in conditions_for {
        if let Some(value) = wanted {
            conditions.push(format!("{} = ?", field.column()));
            params.push(Value::Text(value.clone()));
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    let limit_clause = match filter.limit {
        Some(limit) => format!("LIMIT {limit}"),
        None => String::new(),
    };

    let sql = format!(
        "SELECT {} FROM snDatabase {} ORDER BY AUID {}",
        select_columns(),
        where_clause,
        limit_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let songs = stmt
        .query_map(params_from_iter(params), row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(songs)
}

/// Get a single song by id
pub fn get_song_by_id(conn: &Connection, id: i64) -> DbResult<Option<InventoryRecord>> {
    let sql = format!("SELECT {} FROM snDatabase WHERE AUID = ?", select_columns());
    let mut stmt = conn.prepare(&sql)?;

    match stmt.query_row([id], row_to_record) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert a song and return its id
pub fn add_song(conn: &Connection, record: &NewRecord) -> DbResult<i64> {
    let values = record.fields();
    let mut columns: Vec<&str> = values.iter().map(|(field, _)| field.column()).collect();
    let mut params: Vec<Value> = values.iter().map(|(_, value)| to_sql(value)).collect();

    columns.push("fldDateAdded");
    params.push(Value::Text(
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    ));

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO snDatabase ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(params))?;

    Ok(conn.last_insert_rowid())
}

/// Apply field changes to one song
///
/// # Returns
/// `false` when no song has that id
pub fn update_song_fields(
    conn: &Connection,
    id: i64,
    changes: &[(Field, FieldValue)],
) -> DbResult<bool> {
    if changes.iter().any(|(field, _)| *field == Field::Id) {
        return Err(DbError::Constraint("song id cannot be changed".into()));
    }
    if changes.is_empty() {
        return Ok(get_song_by_id(conn, id)?.is_some());
    }

    let assignments: Vec<String> = changes
        .iter()
        .map(|(field, _)| format!("{} = ?", field.column()))
        .collect();
    let mut params: Vec<Value> = changes.iter().map(|(_, value)| to_sql(value)).collect();
    params.push(Value::Integer(id));

    let sql = format!(
        "UPDATE snDatabase SET {} WHERE AUID = ?",
        assignments.join(", ")
    );
    let rows = conn.execute(&sql, params_from_iter(params))?;
    Ok(rows > 0)
}

/// Number of songs in the inventory
pub fn count_songs(conn: &Connection) -> DbResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM snDatabase", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{create_tables, run_migrations};

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn song(artist: &str, title: &str, path: &str) -> NewRecord {
        NewRecord {
            artist_id: 3,
            artist: artist.to_string(),
            title: title.to_string(),
            path: path.to_string(),
            duration: 215.4,
            genre_ids: [7, 0, 0],
            enabled: true,
            priority: 5,
            fade_duration: 1.0,
            volume: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get_song() {
        let conn = setup_test_db();
        let payload = song("Madonna", "Vogue", "b:\\songs\\Madonna - Vogue.mp3");

        let id = add_song(&conn, &payload).unwrap();
        assert!(id > 0);

        let stored = get_song_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.fields, payload);
        assert!(get_song_by_id(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_filter_and_limit() {
        let conn = setup_test_db();
        add_song(&conn, &song("A", "One", "b:\\1.mp3")).unwrap();
        add_song(&conn, &song("A", "Two", "b:\\2.mp3")).unwrap();
        add_song(&conn, &song("B", "One", "b:\\3.mp3")).unwrap();

        let all = get_songs(&conn, &RecordFilter::all()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        let by_artist = get_songs(
            &conn,
            &RecordFilter {
                artist: Some("A".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_artist.len(), 2);

        let by_path = get_songs(&conn, &RecordFilter::with_path("b:\\3.mp3")).unwrap();
        assert_eq!(by_path.len(), 1);
        assert_eq!(by_path[0].artist(), "B");

        let limited = get_songs(
            &conn,
            &RecordFilter {
                limit: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(count_songs(&conn).unwrap(), 3);
    }

    #[test]
    fn test_update_song_fields() {
        let conn = setup_test_db();
        let id = add_song(&conn, &song("A", "One", "b:\\old.mp3")).unwrap();

        let changed = update_song_fields(
            &conn,
            id,
            &[(Field::Path, FieldValue::Text("b:\\new.mp3".into()))],
        )
        .unwrap();
        assert!(changed);

        let stored = get_song_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(stored.path(), "b:\\new.mp3");
        assert_eq!(stored.title(), "One");

        assert!(!update_song_fields(&conn, 999, &[(Field::Title, "x".into())]).unwrap());
        assert!(update_song_fields(&conn, id, &[(Field::Id, FieldValue::Int(5))]).is_err());
    }

    #[test]
    fn test_legacy_values_are_coerced() {
        let conn = setup_test_db();
        conn.execute(
            "INSERT INTO snDatabase (fldArtistName, fldTitle, fldFilename, fldYear, fldDuration,
             fldEnabled, fldPriority, fldCat1a)
             VALUES ('X', 'Y', NULL, ' 1987 ', '201', -1, 'n/a', 4.0)",
            [],
        )
        .unwrap();

        let songs = get_songs(&conn, &RecordFilter::all()).unwrap();
        let fields = &songs[0].fields;
        assert_eq!(fields.year, 1987);
        assert_eq!(fields.duration, 201.0);
        assert!(fields.enabled);
        assert_eq!(fields.priority, 0);
        assert_eq!(fields.genre_ids[0], 4);
        assert_eq!(fields.path, "");
    }
}
