mod admin;
mod lessons;
mod presentations;
mod static_files;

use crate::api::response::ApiError;
use crate::intake::IntakeError;
use crate::pipeline::PipelineError;

pub use admin::health;
pub use lessons::{create_lesson, delete_lesson, get_lesson, list_lessons};
pub use presentations::{
    create_link, delete_presentation, list_presentations, upload_presentations,
};
pub use static_files::serve_upload;

/// Map a PipelineError to an ApiError
fn pipeline_error(e: PipelineError) -> ApiError {
    match e {
        PipelineError::Intake(IntakeError::InvalidFileType(mime)) => {
            ApiError::bad_request(format!("Invalid file type: {mime}"))
        }
        PipelineError::Intake(err @ IntakeError::FileTooLarge { .. }) => {
            ApiError::payload_too_large(err.to_string())
        }
        PipelineError::LessonNotFound => ApiError::not_found("Lesson not found"),
        PipelineError::RecordNotFound => ApiError::not_found("Presentation not found"),
        PipelineError::StorageUpload(msg) => {
            ApiError::internal(format!("Failed to store file: {msg}"))
        }
        PipelineError::Database(e) => ApiError::internal(e.to_string()),
    }
}
