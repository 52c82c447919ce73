//! Audit: where is every inventory record's file?
//!
//! Each record lands in exactly one bucket: found on the live filesystem,
//! present in a virtual snapshot, moved (same file name seen in another
//! directory of the snapshot) or missing. The inverse query lists files on
//! disk that no record points at.

mod reconciler;

use serde::{Deserialize, Serialize};

pub use reconciler::AuditReconciler;

/// An inventory record whose file is not where the inventory says
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub artist: String,
    pub title: String,
    /// Path as stored in the inventory
    pub db_path: String,
    /// Path after drive remapping
    pub resolved_path: String,
    /// Snapshot paths with the same file name, only set for moved entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
}

/// Result of one audit pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Records examined
    pub total: usize,
    pub found: usize,
    #[serde(rename = "virtual")]
    pub virtual_present: usize,
    pub moved: Vec<AuditEntry>,
    pub missing: Vec<AuditEntry>,
    /// Records with an empty path
    pub no_path: usize,
    /// False when the inventory could not be read
    pub complete: bool,
}

impl AuditReport {
    /// Records with no file at the expected location
    pub fn problem_count(&self) -> usize {
        self.moved.len() + self.missing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_virtual_key() {
        let report = AuditReport {
            total: 3,
            virtual_present: 2,
            complete: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["virtual"], 2);
        assert!(json.get("virtual_present").is_none());
        assert_eq!(report.problem_count(), 0);
    }

    #[test]
    fn test_entry_omits_empty_candidates() {
        let entry = AuditEntry {
            id: 1,
            artist: "A".into(),
            title: "B".into(),
            db_path: "b:\\a.mp3".into(),
            resolved_path: "z:\\a.mp3".into(),
            candidates: vec![],
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("candidates"));
    }
}
