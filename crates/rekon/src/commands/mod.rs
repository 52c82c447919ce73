//! Operator commands behind the `rekon` binary.
//!
//! Each command takes an open [`Session`] and returns plain data; printing
//! is left to `main`.

mod audit;
mod genre;
mod import;
mod init;
mod snapshot;

use anyhow::{Context, Result};
use tracing::{info, warn};

use rekon_core::parser::TagSource;
use rekon_core::{ReconcileContext, VirtualSnapshot};

use crate::config::AppConfig;
use crate::db::taxonomy::load_taxonomy;
use crate::db::{Database, SqliteArtists, SqliteInventory};
use crate::scanner::{LiveFileSystem, LoftyTagSource, MetadataSnapshot};

pub use audit::{audit, untracked};
pub use genre::genre_add;
pub use import::{
    ImportOptions, ImportOutcome, PlannedImport, import, load_candidates, preview, save_candidates,
};
pub use init::{InitReport, init};
pub use snapshot::snapshot;

/// Open database, store adapters and reconcile context for one run
pub struct Session {
    pub config: AppConfig,
    pub db: Database,
    pub ctx: ReconcileContext,
    pub store: SqliteInventory,
    pub artists: SqliteArtists,
}

impl Session {
    pub fn open(config: AppConfig) -> Result<Self> {
        let db = Database::new(&config.database)
            .with_context(|| format!("Failed to open database {}", config.database.display()))?;
        let taxonomy = db
            .with_conn(load_taxonomy)
            .context("Failed to load genre/decade tables")?;
        info!(
            "Opened {} ({} genres, {} decades)",
            config.database.display(),
            taxonomy.genre_count(),
            taxonomy.decade_count()
        );

        let ctx = ReconcileContext::new(config.reconcile.clone(), taxonomy);
        Ok(Self {
            store: SqliteInventory::new(db.clone()),
            artists: SqliteArtists::new(db.clone()),
            config,
            db,
            ctx,
        })
    }

    /// In-memory session, for tests
    pub fn in_memory(config: AppConfig) -> Result<Self> {
        let db = Database::new_in_memory()?;
        let taxonomy = db.with_conn(load_taxonomy)?;
        let ctx = ReconcileContext::new(config.reconcile.clone(), taxonomy);
        Ok(Self {
            store: SqliteInventory::new(db.clone()),
            artists: SqliteArtists::new(db.clone()),
            config,
            db,
            ctx,
        })
    }

    /// Rebuild the context after the taxonomy tables changed
    pub fn reload_taxonomy(&mut self) -> Result<()> {
        let taxonomy = self.db.with_conn(load_taxonomy)?;
        self.ctx = ReconcileContext::new(self.config.reconcile.clone(), taxonomy);
        Ok(())
    }

    /// Tags from the metadata snapshot when configured, else from the files
    pub fn tag_source(&self) -> Result<Box<dyn TagSource>> {
        match &self.config.metadata_snapshot {
            Some(path) if path.exists() => {
                let snapshot = MetadataSnapshot::load(path).with_context(|| {
                    format!("Failed to load metadata snapshot {}", path.display())
                })?;
                Ok(Box::new(snapshot))
            }
            Some(path) => {
                warn!(
                    "Metadata snapshot {} not found, reading tags from files",
                    path.display()
                );
                Ok(Box::new(LoftyTagSource))
            }
            None => Ok(Box::new(LoftyTagSource)),
        }
    }

    pub fn live_files(&self) -> LiveFileSystem {
        LiveFileSystem::new(self.config.base_songs_path.clone())
    }

    /// The captured directory listing, if one is configured
    pub fn virtual_snapshot(&self) -> Result<Option<VirtualSnapshot>> {
        self.config
            .snapshot_log
            .as_ref()
            .map(|path| {
                VirtualSnapshot::load(path)
                    .with_context(|| format!("Failed to read snapshot log {}", path.display()))
            })
            .transpose()
    }
}
