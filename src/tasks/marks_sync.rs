use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::metrics::MARKS_SYNC_SWEEP_ATTEMPTS_TOTAL;
use crate::core::state::AppState;
use crate::repositories;
use crate::services::mark_sync::{self, SyncOutcome};

#[derive(Debug, Default, Clone, Serialize)]
pub(crate) struct SweepSummary {
    pub(crate) scanned: usize,
    pub(crate) synced: usize,
    pub(crate) already_synced: usize,
    pub(crate) failed: usize,
}

/// Retries up to `limit` completed, unsynced attempts, least recently tried first.
///
/// A failing attempt is logged and counted and the batch moves on; each call
/// is bounded by the analyzer client's timeout.
pub(crate) async fn sync_pending_attempts(state: &AppState, limit: u32) -> Result<SweepSummary> {
    let pending = repositories::attempts::list_pending_sync(state.db(), i64::from(limit))
        .await
        .context("Failed to fetch attempts pending marks sync")?;

    let mut summary = SweepSummary { scanned: pending.len(), ..SweepSummary::default() };
    if pending.is_empty() {
        return Ok(summary);
    }

    for attempt in &pending {
        metrics::counter!(MARKS_SYNC_SWEEP_ATTEMPTS_TOTAL).increment(1);
        match mark_sync::sync_attempt(state, attempt.id, None).await {
            Ok(SyncOutcome::Synced { .. }) => summary.synced += 1,
            Ok(SyncOutcome::AlreadySynced) => summary.already_synced += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(attempt_id = attempt.id, error = %err, "Sweep failed to sync attempt");
            }
        }
    }

    tracing::info!(
        scanned = summary.scanned,
        synced = summary.synced,
        failed = summary.failed,
        "Marks sync sweep finished"
    );

    Ok(summary)
}
