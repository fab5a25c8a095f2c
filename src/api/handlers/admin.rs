use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::storage::models::Submission;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub annotations_deleted: u64,
    pub messages_deleted: u64,
    pub submissions_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state
        .db
        .purge_all()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(
        submissions = stats.submissions,
        annotations = stats.annotations,
        messages = stats.messages,
        "Purged all data"
    );

    Ok(JSend::success(PurgeResponse {
        annotations_deleted: stats.annotations,
        messages_deleted: stats.messages,
        submissions_deleted: stats.submissions,
    }))
}

/// All users' submissions for an ft_id, with store metadata.
pub async fn admin_submissions(
    State(state): State<Arc<AppState>>,
    Path(ft_id): Path<String>,
) -> Result<Json<JSend<Vec<Submission>>>, ApiError> {
    let submissions = state
        .service
        .submissions_for_ft_id(&ft_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(JSend::success(submissions))
}
