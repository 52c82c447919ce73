//! Reconciliation settings.
//!
//! Loaded by the application (TOML) and handed to the core through
//! [`crate::context::ReconcileContext`]. Every field has a default so a
//! partial or empty table deserializes cleanly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Genre id assigned when no genre from the tags matches the taxonomy
pub const DEFAULT_UNCLASSIFIED_GENRE_ID: i64 = 18;

/// Placeholder used for artist and title when nothing can be parsed
pub const DEFAULT_FALLBACK: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub fallback_artist: String,
    pub fallback_title: String,
    pub unclassified_genre_id: i64,
    /// Stored prefix -> local prefix, e.g. `"b:" = "z:"`
    pub drive_map: BTreeMap<String, String>,
    pub record_defaults: RecordDefaults,
    pub audit: AuditOptions,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fallback_artist: DEFAULT_FALLBACK.to_string(),
            fallback_title: DEFAULT_FALLBACK.to_string(),
            unclassified_genre_id: DEFAULT_UNCLASSIFIED_GENRE_ID,
            drive_map: BTreeMap::new(),
            record_defaults: RecordDefaults::default(),
            audit: AuditOptions::default(),
        }
    }
}

/// Operational fields written on every new inventory record.
///
/// These mirror what the playout automation expects for a freshly added
/// song: enabled for manual and automatic rotation, medium priority, no
/// cue points and a one second fade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefaults {
    pub enabled: bool,
    pub enabled_auto: bool,
    pub vocal_present: bool,
    pub priority: i64,
    pub intro: f64,
    pub mix: f64,
    pub fade_duration: f64,
    pub fade_position: f64,
    pub start_position: f64,
    pub fade_in: f64,
    pub volume: i64,
    pub broadcasts: i64,
    pub vote_count: i64,
    pub no_rds: bool,
    pub do_not_auto_alter: bool,
    pub tempo_id: i64,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            enabled: true,
            enabled_auto: true,
            vocal_present: false,
            priority: 5,
            intro: 0.0,
            mix: 0.0,
            fade_duration: 1.0,
            fade_position: 0.0,
            start_position: 0.0,
            fade_in: 0.0,
            volume: 100,
            broadcasts: 0,
            vote_count: 1,
            no_rds: false,
            do_not_auto_alter: false,
            tempo_id: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditOptions {
    /// Compare paths without their drive letter
    pub ignore_drive_letters: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.fallback_artist, "Unknown");
        assert_eq!(config.unclassified_genre_id, 18);
        assert!(config.drive_map.is_empty());
        assert_eq!(config.record_defaults.priority, 5);
        assert_eq!(config.record_defaults.fade_duration, 1.0);
        assert_eq!(config.record_defaults.volume, 100);
        assert!(!config.audit.ignore_drive_letters);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReconcileConfig = serde_json::from_str(
            r#"{"unclassified_genre_id": 7, "drive_map": {"b:": "z:"}, "record_defaults": {"priority": 3}}"#,
        )
        .unwrap();

        assert_eq!(config.unclassified_genre_id, 7);
        assert_eq!(config.fallback_title, "Unknown");
        assert_eq!(config.drive_map.get("b:").map(String::as_str), Some("z:"));
        assert_eq!(config.record_defaults.priority, 3);
        assert!(config.record_defaults.enabled);
    }
}
