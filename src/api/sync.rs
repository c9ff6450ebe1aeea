use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStaff;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::sync::{SyncPendingRequest, SyncStatusResponse};
use crate::tasks::marks_sync::{self, SweepSummary};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(sync_status))
        .route("/pending", post(sync_pending))
}

async fn sync_status(
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let counts = repositories::attempts::sync_counts_by_course(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count synced attempts"))?;

    let analyzer_available = match state.analyzer().ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Analyzer status check failed");
            false
        }
    };

    Ok(Json(SyncStatusResponse::new(analyzer_available, counts)))
}

async fn sync_pending(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    payload: Option<Json<SyncPendingRequest>>,
) -> Result<Json<SweepSummary>, ApiError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let limit = payload.limit.unwrap_or(state.settings().sync().sweep_batch_size);
    tracing::info!(staff_id = %staff.id, limit, "Manual marks sync sweep requested");

    let summary = marks_sync::sync_pending_attempts(&state, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sync pending attempts"))?;

    Ok(Json(summary))
}
