use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::pipeline_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::catalog::models::{ContentCategory, Presentation};
use crate::intake::RawUpload;
use crate::{pipeline, AppState, ACTING_USER_ID};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PresentationResponse {
    pub id: String,
    pub lesson_id: String,
    pub content_type: ContentCategory,
    pub file_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub display_order: u32,
    pub created_by: i64,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_presentations(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<Json<JSend<Vec<PresentationResponse>>>, ApiError> {
    let items = state
        .db
        .list_presentations(&lesson_id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(JSend::success(
        items.iter().map(presentation_to_response).collect(),
    ))
}

/// Multipart batch upload. `files` fields carry the blobs; `titles` and
/// `descriptions` fields, in the order they appear, attach to the files at
/// the same position.
pub async fn upload_presentations(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<JSend<Vec<PresentationResponse>>>, ApiError> {
    let mut uploads: Vec<RawUpload> = Vec::new();
    let mut titles: Vec<Option<String>> = Vec::new();
    let mut descriptions: Vec<Option<String>> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                uploads.push(RawUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "titles" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid title: {e}")))?;
                titles.push((!text.is_empty()).then_some(text));
            }
            "descriptions" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid description: {e}")))?;
                descriptions.push((!text.is_empty()).then_some(text));
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::bad_request("at least one file is required"));
    }

    let created = pipeline::ingest_batch(
        &state.db,
        state.object_store.as_ref(),
        &lesson_id,
        uploads,
        titles,
        descriptions,
        ACTING_USER_ID,
        state.config.max_upload_size,
        &state.config.ffmpeg_path,
    )
    .await
    .map_err(pipeline_error)?;

    tracing::debug!(lesson_id = %lesson_id, count = created.len(), "Uploaded presentations");
    Ok(JSend::success(
        created.iter().map(presentation_to_response).collect(),
    ))
}

pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
    AppJson(req): AppJson<CreateLinkRequest>,
) -> Result<Json<JSend<PresentationResponse>>, ApiError> {
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("url is required"))?;

    let created = pipeline::create_link(
        &state.db,
        &lesson_id,
        url,
        req.title,
        req.description,
        ACTING_USER_ID,
    )
    .map_err(pipeline_error)?;

    tracing::debug!(presentation_id = %created.id, "Added presentation link");
    Ok(JSend::success(presentation_to_response(&created)))
}

pub async fn delete_presentation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<PresentationResponse>>, ApiError> {
    let deleted = pipeline::delete_presentation(&state.db, state.object_store.as_ref(), &id)
        .await
        .map_err(pipeline_error)?;

    Ok(JSend::success(presentation_to_response(&deleted)))
}

// ============================================================================
// Helpers
// ============================================================================

fn presentation_to_response(p: &Presentation) -> PresentationResponse {
    PresentationResponse {
        id: p.id.clone(),
        lesson_id: p.lesson_id.clone(),
        content_type: p.category,
        file_url: p.file_url.clone(),
        title: p.title.clone(),
        description: p.description.clone(),
        display_order: p.display_order,
        created_by: p.created_by,
        created_at: p.created_at.to_rfc3339(),
    }
}
