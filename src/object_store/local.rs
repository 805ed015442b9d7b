use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{sanitize_file_name, ObjectStore, ObjectStoreError, StoredObject};

/// Local filesystem backend. Blobs live under a single uploads root and are
/// served by the `/uploads/*path` static route; the external ref is the
/// path relative to that root.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn store(
        &self,
        file_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, ObjectStoreError> {
        let key = format!(
            "{}-{}",
            uuid::Uuid::new_v4(),
            sanitize_file_name(file_name)
        );
        let path = self.object_path(&key);
        tokio::fs::write(&path, &data).await?;

        Ok(StoredObject {
            public_url: format!("/uploads/{key}"),
            external_ref: key,
        })
    }

    async fn delete(&self, external_ref: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(external_ref);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}
