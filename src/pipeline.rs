//! Ingestion pipeline and deletion coordination.
//!
//! Creation path: intake -> compression -> object store -> catalog. Catalog
//! rows for a batch land in one transaction only after every blob is stored;
//! any failure rolls the batch's blobs back, so the caller sees all-or-nothing.
//!
//! Deletion path: catalog row (with sibling renumbering) first, blob second
//! and best-effort. A slow or failed remote delete can orphan a reclaimable
//! blob but never leaves a dangling catalog row.

use thiserror::Error;

use crate::catalog::models::{ContentCategory, NewPresentation, Presentation};
use crate::catalog::{Database, DatabaseError};
use crate::compress;
use crate::intake::{self, IntakeError, RawUpload};
use crate::object_store::{ObjectStore, StoredObject};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("Storage upload failed: {0}")]
    StorageUpload(String),
    #[error("Lesson not found")]
    LessonNotFound,
    #[error("Presentation not found")]
    RecordNotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Ingest a batch of uploads for a lesson. `titles` and `descriptions` are
/// parallel to `uploads`; missing entries mean no title/description.
#[allow(clippy::too_many_arguments)]
pub async fn ingest_batch(
    db: &Database,
    store: &dyn ObjectStore,
    lesson_id: &str,
    uploads: Vec<RawUpload>,
    titles: Vec<Option<String>>,
    descriptions: Vec<Option<String>>,
    created_by: i64,
    max_file_size: u64,
    ffmpeg_path: &str,
) -> Result<Vec<Presentation>, PipelineError> {
    // Fail before any compression or storage work
    if db.get_lesson(lesson_id)?.is_none() {
        return Err(PipelineError::LessonNotFound);
    }
    let accepted = intake::validate_batch(uploads, max_file_size)?;

    let compressed = compress::compress_batch(accepted, ffmpeg_path).await;

    // Phase 1: store every blob. On failure, roll back the ones already
    // stored and fail the whole batch.
    let mut stored: Vec<StoredObject> = Vec::with_capacity(compressed.len());
    for file in &compressed {
        match store
            .store(&file.file_name, &file.mime_type, file.data.clone())
            .await
        {
            Ok(obj) => stored.push(obj),
            Err(e) => {
                rollback_blobs(store, &stored).await;
                return Err(PipelineError::StorageUpload(e.to_string()));
            }
        }
    }

    // Phase 2: catalog all rows in one transaction
    let items: Vec<NewPresentation> = compressed
        .iter()
        .zip(stored.iter())
        .enumerate()
        .map(|(i, (file, obj))| NewPresentation {
            category: file.category,
            file_url: obj.public_url.clone(),
            external_ref: Some(obj.external_ref.clone()),
            title: titles.get(i).cloned().flatten(),
            description: descriptions.get(i).cloned().flatten(),
            created_by,
        })
        .collect();

    match db.create_presentations(lesson_id, items) {
        Ok(Some(created)) => {
            tracing::debug!(
                lesson_id = %lesson_id,
                count = created.len(),
                "Ingested presentation batch"
            );
            Ok(created)
        }
        Ok(None) => {
            rollback_blobs(store, &stored).await;
            Err(PipelineError::LessonNotFound)
        }
        Err(e) => {
            rollback_blobs(store, &stored).await;
            Err(e.into())
        }
    }
}

/// Catalog an external link. Links bypass compression and the object store
/// entirely: the caller-supplied URL is recorded verbatim and no blob is
/// owned.
pub fn create_link(
    db: &Database,
    lesson_id: &str,
    url: String,
    title: Option<String>,
    description: Option<String>,
    created_by: i64,
) -> Result<Presentation, PipelineError> {
    let item = NewPresentation {
        category: ContentCategory::Link,
        file_url: url,
        external_ref: None,
        title: Some(title.unwrap_or_else(|| "Online Presentation".to_string())),
        description,
        created_by,
    };

    match db.create_presentations(lesson_id, vec![item])? {
        Some(mut created) => Ok(created.remove(0)),
        None => Err(PipelineError::LessonNotFound),
    }
}

/// Delete one presentation: catalog row and renumbering commit first, then
/// the blob is deleted best-effort (never for links).
pub async fn delete_presentation(
    db: &Database,
    store: &dyn ObjectStore,
    id: &str,
) -> Result<Presentation, PipelineError> {
    let deleted = db
        .delete_presentation(id)?
        .ok_or(PipelineError::RecordNotFound)?;

    if deleted.category.owns_blob() {
        if let Some(ref external_ref) = deleted.external_ref {
            if let Err(e) = store.delete(external_ref).await {
                tracing::warn!(
                    presentation_id = %deleted.id,
                    external_ref = %external_ref,
                    error = %e,
                    "Failed to delete blob, leaving it orphaned"
                );
            }
        }
    }

    tracing::debug!(presentation_id = %deleted.id, "Deleted presentation");
    Ok(deleted)
}

/// Delete a lesson and everything it owns. Children are captured before the
/// catalog cascade so their blobs can be cleaned up afterwards.
pub async fn delete_lesson(
    db: &Database,
    store: &dyn ObjectStore,
    lesson_id: &str,
) -> Result<(), PipelineError> {
    let (lesson, children) = db
        .delete_lesson(lesson_id)?
        .ok_or(PipelineError::LessonNotFound)?;

    for child in &children {
        if child.category.owns_blob() {
            if let Some(ref external_ref) = child.external_ref {
                if let Err(e) = store.delete(external_ref).await {
                    tracing::warn!(
                        lesson_id = %lesson.id,
                        external_ref = %external_ref,
                        error = %e,
                        "Failed to delete blob during lesson cascade"
                    );
                }
            }
        }
    }

    tracing::debug!(
        lesson_id = %lesson.id,
        presentations = children.len(),
        "Deleted lesson and its presentations"
    );
    Ok(())
}

async fn rollback_blobs(store: &dyn ObjectStore, stored: &[StoredObject]) {
    for obj in stored {
        if let Err(e) = store.delete(&obj.external_ref).await {
            tracing::warn!(
                external_ref = %obj.external_ref,
                error = %e,
                "Failed to roll back blob after batch failure"
            );
        }
    }
}
