//! rekon-core: Core library for the rekon inventory reconciler
//!
//! This crate holds the pure reconciliation logic shared by the CLI and any
//! other front end. It never opens a database or reads audio tags itself;
//! those are reached through the collaborator traits in [`inventory`],
//! [`parser::TagSource`] and [`snapshot::FileSource`].
//!
//! # Architecture
//!
//! - `normalize`: text/path canonicalization used by every matching step
//! - `fields`: compile-time mapping between inventory columns and field names
//! - `inventory`: record model and storage collaborator traits
//! - `context`: configuration, taxonomy and path resolution bundled per session
//! - `parser`: filename/tag metadata parsing
//! - `snapshot`: virtual (offline) directory listings
//! - `import`: preview classification and batch execution
//! - `audit`: found/virtual/moved/missing reconciliation and untracked files
//!
//! # Usage
//!
//! ```ignore
//! use rekon_core::import::ImportService;
//!
//! let mut service = ImportService::new(&ctx, &store, &artists, &tags);
//! let mut candidates = service.preview(&paths, None::<fn(usize, usize)>)?;
//! rekon_core::import::apply_conflict_policy(&mut candidates, ConflictPolicy::Skip);
//! let summary = service.execute(candidates, None::<fn(usize, usize, &ImportResult)>);
//!
//! let report = AuditReconciler::new(&ctx, &store, &live, snapshot.as_ref()).run();
//! ```

pub mod audit;
pub mod config;
pub mod context;
pub mod fields;
pub mod import;
pub mod inventory;
pub mod normalize;
pub mod parser;
pub mod paths;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types at crate root for convenience
pub use audit::{AuditEntry, AuditReconciler, AuditReport};
pub use config::{AuditOptions, ReconcileConfig, RecordDefaults};
pub use context::{ReconcileContext, Taxonomy};
pub use fields::{Field, FieldValue};
pub use import::{
    ConflictPolicy, ImportAction, ImportCandidate, ImportResult, ImportService, ImportStatus,
    ImportSummary, UserDecision,
};
pub use inventory::{ArtistDirectory, InventoryRecord, InventoryStore, NewRecord, StoreError};
pub use parser::{MetadataParser, ParseSource, ParsedMetadata, TagData, TagSource};
pub use paths::PathResolver;
pub use snapshot::{FileSource, VirtualSnapshot};
