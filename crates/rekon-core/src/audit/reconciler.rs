use once_cell::unsync::OnceCell;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info};

use super::{AuditEntry, AuditReport};
use crate::context::ReconcileContext;
use crate::inventory::{InventoryRecord, InventoryStore, RecordFilter, StoreError};
use crate::normalize::{file_name_key, normalize_path};
use crate::snapshot::{FileSource, VirtualSnapshot};

/// Batch reconciler between the inventory and the files it points at.
///
/// `live` answers for the mounted filesystem; `snapshot`, when given, is an
/// earlier listing used for virtual presence and for tracking down moved
/// files.
pub struct AuditReconciler<'a> {
    ctx: &'a ReconcileContext,
    store: &'a dyn InventoryStore,
    live: &'a dyn FileSource,
    snapshot: Option<&'a VirtualSnapshot>,
    /// File name key -> snapshot paths, built on first use
    name_map: OnceCell<HashMap<String, Vec<String>>>,
}

impl<'a> AuditReconciler<'a> {
    pub fn new(
        ctx: &'a ReconcileContext,
        store: &'a dyn InventoryStore,
        live: &'a dyn FileSource,
        snapshot: Option<&'a VirtualSnapshot>,
    ) -> Self {
        Self {
            ctx,
            store,
            live,
            snapshot,
            name_map: OnceCell::new(),
        }
    }

    /// Classify every inventory record.
    ///
    /// An unreadable inventory is logged and yields an empty report with
    /// `complete` unset.
    pub fn run(&self) -> AuditReport {
        info!("Starting library audit");
        let records = match self.load_records() {
            Ok(records) => records,
            Err(e) => {
                error!("Audit aborted, inventory unreadable: {}", e);
                return AuditReport::default();
            }
        };

        let mut report = AuditReport {
            total: records.len(),
            complete: true,
            ..Default::default()
        };

        for record in &records {
            let db_path = record.path();
            if db_path.trim().is_empty() {
                report.no_path += 1;
                continue;
            }

            let resolved = self.ctx.resolver.to_local(db_path);
            if self.live.exists(&resolved) {
                report.found += 1;
                continue;
            }
            // Listings are captured on the playout server, in stored form
            if self
                .snapshot
                .is_some_and(|s| s.exists(db_path) || s.exists(&resolved))
            {
                report.virtual_present += 1;
                continue;
            }

            let candidates = self.relocation_candidates(db_path, &resolved);
            let entry = AuditEntry {
                id: record.id,
                artist: record.artist().to_string(),
                title: record.title().to_string(),
                db_path: db_path.to_string(),
                resolved_path: resolved,
                candidates,
            };
            if entry.candidates.is_empty() {
                report.missing.push(entry);
            } else {
                debug!("Record {} moved, {} candidates", entry.id, entry.candidates.len());
                report.moved.push(entry);
            }
        }

        info!(
            "Audit complete: {} found, {} virtual, {} moved, {} missing",
            report.found,
            report.virtual_present,
            report.moved.len(),
            report.missing.len()
        );
        report
    }

    /// Files present on disk (or in the snapshot, when one is loaded) that
    /// no inventory record points at, sorted.
    ///
    /// An unreadable inventory is logged and yields an empty list.
    pub fn find_untracked(&self) -> Vec<String> {
        info!("Starting untracked files scan");
        let records = match self.load_records() {
            Ok(records) => records,
            Err(e) => {
                error!("Untracked scan aborted, inventory unreadable: {}", e);
                return Vec::new();
            }
        };

        let normalizer = &self.ctx.normalizer;
        let tracked: HashSet<String> = records
            .iter()
            .flat_map(|r| {
                [
                    normalizer.normalize(r.path()),
                    normalizer.normalize(&self.ctx.resolver.to_local(r.path())),
                ]
            })
            .filter(|p| !p.is_empty())
            .collect();

        let on_disk = match self.snapshot {
            Some(snapshot) => snapshot.all_paths(),
            None => self.live.all_paths(),
        };

        let mut untracked: Vec<String> = on_disk
            .into_iter()
            .filter(|p| !tracked.contains(&normalizer.normalize(p)))
            .collect();
        untracked.sort();
        untracked.dedup();

        info!("Found {} untracked files", untracked.len());
        untracked
    }

    fn load_records(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        self.store.fetch(&RecordFilter::all())
    }

    /// Snapshot paths sharing the record's file name but not its location,
    /// in either stored or resolved form
    fn relocation_candidates(&self, db_path: &str, resolved: &str) -> Vec<String> {
        let key = file_name_key(resolved);
        if key.is_empty() {
            return Vec::new();
        }
        let stored = normalize_path(db_path);
        let local = normalize_path(resolved);
        self.name_map()
            .get(&key)
            .map(|paths| {
                paths
                    .iter()
                    .filter(|p| {
                        let p = normalize_path(p.as_str());
                        p != stored && p != local
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn name_map(&self) -> &HashMap<String, Vec<String>> {
        self.name_map.get_or_init(|| {
            let mut map: HashMap<String, Vec<String>> = HashMap::new();
            if let Some(snapshot) = self.snapshot {
                for path in snapshot.iter() {
                    let key = file_name_key(path);
                    if !key.is_empty() {
                        map.entry(key).or_default().push(path.to_string());
                    }
                }
            }
            debug!("File name map built: {} names", map.len());
            map
        })
    }
}
