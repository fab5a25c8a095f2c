use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::api::response::{outcome_response, ApiError, AppJson};
use crate::auth::CurrentUser;
use crate::storage::models::SubmissionRequest;
use crate::AppState;

// ============================================================================
// Handlers
// ============================================================================

/// Route: POST /submit
///
/// A JSON `null` body reaches the validator as a missing submission.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(request): AppJson<Option<SubmissionRequest>>,
) -> (StatusCode, Json<Vec<String>>) {
    let outcome = state.service.process_submission(&user, request).await;
    outcome_response(outcome)
}

/// Route: DELETE /delete/:ft_id
pub async fn delete_submission(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(ft_id): Path<String>,
) -> (StatusCode, Json<Vec<String>>) {
    let outcome = state.service.process_deletion(&user, &ft_id).await;
    outcome_response(outcome)
}

/// Route: DELETE /delete/ (no ft_id in the path)
pub async fn delete_submission_without_ft_id(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> (StatusCode, Json<Vec<String>>) {
    let outcome = state.service.process_deletion(&user, "").await;
    outcome_response(outcome)
}

/// Route: GET /getSubmissionStatus/:ft_id
pub async fn submission_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(ft_id): Path<String>,
) -> Result<Response, ApiError> {
    let view = state
        .service
        .submission_status(&user, &ft_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(match view {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// Route: POST /result
///
/// Sink for completion callbacks, handy as the `callback` of test submissions.
pub async fn result(AppJson(body): AppJson<serde_json::Value>) -> StatusCode {
    tracing::info!(body = %body, "Callback received");
    StatusCode::OK
}
