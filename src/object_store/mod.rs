mod gcs;
mod local;

pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Where a stored blob ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Public retrieval address, recorded as the presentation's file_url.
    pub public_url: String,
    /// Opaque handle the backend needs to delete the blob later.
    pub external_ref: String,
}

/// Abstraction over blob storage backends. Exactly one implementation is
/// active per deployment, chosen at startup from configuration. Link
/// presentations never touch this trait.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Durably store a blob, deriving a collision-resistant key from the
    /// suggested file name.
    async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, ObjectStoreError>;

    /// Delete a previously stored blob. Deleting a ref that is already gone
    /// is not an error.
    async fn delete(&self, external_ref: &str) -> Result<(), ObjectStoreError>;
}

/// Reduce an arbitrary client file name to a safe key fragment: base name
/// only, alphanumerics plus `.`/`-`/`_`, capped length.
pub(crate) fn sanitize_file_name(file_name: &str) -> String {
    const MAX: usize = 128;

    let base = std::path::Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    if base.contains("..") {
        return "file".to_string();
    }

    let sanitized: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_file_name;

    #[test]
    fn sanitize_keeps_safe_names() {
        assert_eq!(sanitize_file_name("slides-week3.pptx"), "slides-week3.pptx");
    }

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("/tmp/a b?.png"), "a_b_.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "file");
    }

    #[test]
    fn sanitize_rejects_empty_names() {
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("???"), "file");
    }
}
