use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::auth::CurrentUser;
use crate::AppState;

/// Route: GET /getAnnotations/:ft_id
pub async fn get_annotations(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(ft_id): Path<String>,
) -> Result<Response, ApiError> {
    let list = state
        .service
        .annotations(&user, &ft_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if list.is_empty() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    Ok(Json(list).into_response())
}

/// Route: GET /getAnnotations/:ft_id/:filename
pub async fn get_file_annotations(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((ft_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let view = state
        .service
        .annotations_for_file(&user, &ft_id, &filename)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(match view {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}
