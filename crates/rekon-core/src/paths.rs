//! Drive-letter / prefix remapping between stored and local paths.
//!
//! The inventory keeps paths as the playout server sees them (`b:\songs\..`),
//! while this machine mounts the same share elsewhere (`z:\songs\..`).

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    /// (stored prefix, local prefix), longest stored prefix first
    to_local: Vec<(String, String)>,
    /// (local prefix, stored prefix), longest local prefix first
    to_stored: Vec<(String, String)>,
}

impl PathResolver {
    /// Build a resolver from a stored-prefix -> local-prefix map
    pub fn new(drive_map: &BTreeMap<String, String>) -> Self {
        let mut to_local: Vec<(String, String)> = drive_map
            .iter()
            .filter(|(stored, _)| !stored.is_empty())
            .map(|(stored, local)| (stored.clone(), local.clone()))
            .collect();
        let mut to_stored: Vec<(String, String)> = to_local
            .iter()
            .filter(|(_, local)| !local.is_empty())
            .map(|(stored, local)| (local.clone(), stored.clone()))
            .collect();

        to_local.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        to_stored.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            to_local,
            to_stored,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.to_local.is_empty()
    }

    /// Map a stored inventory path to where it lives on this machine
    pub fn to_local(&self, stored: &str) -> String {
        remap(&self.to_local, stored)
    }

    /// Map a local path back to the form written into the inventory
    pub fn to_stored(&self, local: &str) -> String {
        remap(&self.to_stored, local)
    }
}

fn remap(prefixes: &[(String, String)], path: &str) -> String {
    for (from, to) in prefixes {
        if starts_with_ignore_case(path, from) {
            return format!("{}{}", to, &path[from.len()..]);
        }
    }
    path.to_string()
}

fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len()
        && path.is_char_boundary(prefix.len())
        && path[..prefix.len()].to_lowercase() == prefix.to_lowercase()
}
