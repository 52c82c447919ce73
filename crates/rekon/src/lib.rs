//! rekon: reconcile a broadcast song inventory with the files it points at.
//!
//! This crate wires [`rekon_core`] to its concrete collaborators:
//!
//! - `db`: SQLite inventory (songs, artists, genre/decade/tempo tables)
//! - `scanner`: lofty tag reader, live directory walk, metadata snapshot
//! - `config`: TOML configuration lookup
//! - `commands`: operations behind the `rekon` binary
//! - `logging`: tracing subscriber setup

pub mod commands;
pub mod config;
pub mod db;
pub mod logging;
pub mod scanner;

pub use commands::Session;
pub use config::{AppConfig, ConfigSource};
pub use db::Database;
