use bytes::Bytes;
use thiserror::Error;

use crate::catalog::models::ContentCategory;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),
    #[error("File '{name}' is {size} bytes, exceeding the {max} byte limit")]
    FileTooLarge { name: String, size: u64, max: u64 },
}

/// One file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub file_name: String,
    /// Client-declared content type, if any.
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A validated upload: an in-memory buffer with its resolved MIME type and
/// content category. Downstream stages never touch the client's transport.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub category: ContentCategory,
    pub data: Bytes,
}

/// The fixed allow-list of accepted MIME types.
fn category_for_mime(mime_type: &str) -> Option<ContentCategory> {
    match mime_type {
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
            Some(ContentCategory::Powerpoint)
        }
        "image/jpeg" | "image/png" => Some(ContentCategory::Image),
        "video/mp4" | "video/webm" => Some(ContentCategory::Video),
        _ => None,
    }
}

/// Resolve the MIME type for an upload: trust the declared type unless it is
/// missing or the generic octet-stream, in which case guess from the name.
fn resolve_mime(upload: &RawUpload) -> String {
    upload
        .content_type
        .clone()
        .filter(|ct| ct != "application/octet-stream")
        .or_else(|| {
            mime_guess::from_path(&upload.file_name)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Validate a whole batch, fail-fast: one file outside the allow-list or over
/// the size ceiling rejects the batch before any compression or storage work.
pub fn validate_batch(
    uploads: Vec<RawUpload>,
    max_file_size: u64,
) -> Result<Vec<UploadedFile>, IntakeError> {
    let mut accepted = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let mime_type = resolve_mime(&upload);
        let category = category_for_mime(&mime_type)
            .ok_or_else(|| IntakeError::InvalidFileType(mime_type.clone()))?;

        let size = upload.data.len() as u64;
        if size > max_file_size {
            return Err(IntakeError::FileTooLarge {
                name: upload.file_name,
                size,
                max: max_file_size,
            });
        }

        accepted.push(UploadedFile {
            file_name: upload.file_name,
            mime_type,
            category,
            data: upload.data,
        });
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, content_type: Option<&str>, len: usize) -> RawUpload {
        RawUpload {
            file_name: name.to_string(),
            content_type: content_type.map(|s| s.to_string()),
            data: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn accepts_allow_listed_types() {
        let batch = vec![
            raw("a.jpg", Some("image/jpeg"), 10),
            raw("b.mp4", Some("video/mp4"), 10),
            raw(
                "c.pptx",
                Some("application/vnd.openxmlformats-officedocument.presentationml.presentation"),
                10,
            ),
        ];
        let accepted = validate_batch(batch, 1024).unwrap();
        assert_eq!(accepted[0].category, ContentCategory::Image);
        assert_eq!(accepted[1].category, ContentCategory::Video);
        assert_eq!(accepted[2].category, ContentCategory::Powerpoint);
    }

    #[test]
    fn one_bad_file_rejects_the_batch() {
        let batch = vec![
            raw("a.jpg", Some("image/jpeg"), 10),
            raw("notes.txt", Some("text/plain"), 10),
        ];
        let err = validate_batch(batch, 1024).unwrap_err();
        assert!(matches!(err, IntakeError::InvalidFileType(_)));
    }

    #[test]
    fn guesses_mime_when_declared_type_is_generic() {
        let batch = vec![raw("photo.png", Some("application/octet-stream"), 10)];
        let accepted = validate_batch(batch, 1024).unwrap();
        assert_eq!(accepted[0].mime_type, "image/png");
        assert_eq!(accepted[0].category, ContentCategory::Image);
    }

    #[test]
    fn enforces_size_ceiling() {
        let batch = vec![raw("a.jpg", Some("image/jpeg"), 2048)];
        let err = validate_batch(batch, 1024).unwrap_err();
        assert!(matches!(err, IntakeError::FileTooLarge { .. }));
    }
}
