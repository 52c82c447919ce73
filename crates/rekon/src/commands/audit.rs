use anyhow::{Result, bail};

use rekon_core::{AuditReconciler, AuditReport};

use crate::commands::Session;

/// Classify every inventory record as found, virtual, moved or missing
pub fn audit(session: &Session) -> Result<AuditReport> {
    let snapshot = session.virtual_snapshot()?;
    let live = session.live_files();
    let report = AuditReconciler::new(&session.ctx, &session.store, &live, snapshot.as_ref()).run();
    if !report.complete {
        bail!("Audit incomplete: the inventory could not be read");
    }
    Ok(report)
}

/// Library files no inventory record points at
pub fn untracked(session: &Session) -> Result<Vec<String>> {
    let snapshot = session.virtual_snapshot()?;
    let live = session.live_files();
    let reconciler = AuditReconciler::new(&session.ctx, &session.store, &live, snapshot.as_ref());
    Ok(reconciler.find_untracked())
}
