use anyhow::{Context, Result};
use tracing::info;

use crate::commands::Session;
use crate::db::taxonomy::{Category, add_entry};

/// Add a genre (no-op when it exists) and refresh the session's taxonomy
pub fn genre_add(session: &mut Session, name: &str) -> Result<i64> {
    let id = session
        .db
        .with_conn(|conn| add_entry(conn, Category::Genre, name))
        .with_context(|| format!("Failed to add genre '{}'", name))?;
    info!("Genre '{}' has id {}", name.trim(), id);
    session.reload_taxonomy()?;
    Ok(id)
}
