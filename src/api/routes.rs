use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::auth::require_basic_auth;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let mut authenticated = Router::new()
        // Submissions
        .route("/submit", post(handlers::submit))
        .route("/delete/", delete(handlers::delete_submission_without_ft_id))
        .route("/delete/:ft_id", delete(handlers::delete_submission))
        .route(
            "/getSubmissionStatus/:ft_id",
            get(handlers::submission_status),
        )
        // Annotations
        .route("/getAnnotations/:ft_id", get(handlers::get_annotations))
        .route(
            "/getAnnotations/:ft_id/:filename",
            get(handlers::get_file_annotations),
        );

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, admin routes are available");
        authenticated = authenticated
            .route("/admin/purge", delete(handlers::admin_purge))
            .route(
                "/admin/submissions/:ft_id",
                get(handlers::admin_submissions),
            );
    }

    let authenticated = authenticated.route_layer(middleware::from_fn_with_state(
        Arc::clone(&state),
        require_basic_auth,
    ));

    Router::new()
        .merge(authenticated)
        .route("/result", post(handlers::result))
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
