use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Whole-request cap. The per-file ceiling is enforced at intake; this
    // only has to be large enough that a multi-file batch reaches it.
    let body_limit = state.config.max_body_size as usize;

    Router::new()
        // Lessons (collaborator surface the pipeline hangs off)
        .route("/lessons", post(handlers::create_lesson))
        .route("/lessons/:lesson_id", get(handlers::get_lesson))
        .route("/lessons/:lesson_id", delete(handlers::delete_lesson))
        .route("/quarters/:quarter_id/lessons", get(handlers::list_lessons))
        // Presentations
        .route(
            "/lessons/:lesson_id/presentations",
            get(handlers::list_presentations),
        )
        .route(
            "/lessons/:lesson_id/presentations",
            post(handlers::upload_presentations).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/lessons/:lesson_id/presentations/link",
            post(handlers::create_link),
        )
        .route("/presentations/:id", delete(handlers::delete_presentation))
        // Static content (local backend blobs)
        .route("/uploads/*path", get(handlers::serve_upload))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
