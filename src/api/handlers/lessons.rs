use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::pipeline_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::catalog::models::Lesson;
use crate::{pipeline, AppState, ACTING_USER_ID};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub id: String,
    pub quarter_id: String,
    pub lesson_number: u32,
    pub title: String,
    pub created_by: i64,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    pub quarter_id: String,
    pub title: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateLessonRequest>,
) -> Result<Json<JSend<LessonResponse>>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let lesson = state
        .db
        .create_lesson(&req.quarter_id, &req.title, ACTING_USER_ID)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(lesson_id = %lesson.id, "Created lesson");
    Ok(JSend::success(lesson_to_response(&lesson)))
}

pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<Json<JSend<LessonResponse>>, ApiError> {
    let lesson = state
        .db
        .get_lesson(&lesson_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;

    Ok(JSend::success(lesson_to_response(&lesson)))
}

pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    Path(quarter_id): Path<String>,
) -> Result<Json<JSend<Vec<LessonResponse>>>, ApiError> {
    let lessons = state
        .db
        .list_lessons(&quarter_id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(JSend::success(
        lessons.iter().map(lesson_to_response).collect(),
    ))
}

/// Delete a lesson, cascading catalog rows and blob cleanup to every
/// presentation it owns.
pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    pipeline::delete_lesson(&state.db, state.object_store.as_ref(), &lesson_id)
        .await
        .map_err(pipeline_error)?;

    tracing::debug!(lesson_id = %lesson_id, "Deleted lesson");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn lesson_to_response(lesson: &Lesson) -> LessonResponse {
    LessonResponse {
        id: lesson.id.clone(),
        quarter_id: lesson.quarter_id.clone(),
        lesson_number: lesson.lesson_number,
        title: lesson.title.clone(),
        created_by: lesson.created_by,
        created_at: lesson.created_at.to_rfc3339(),
    }
}
