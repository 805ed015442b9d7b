//! Shared test helpers for lesson-media integration tests.

use std::sync::Arc;

use crate::config::{Config, ServerConfig, StorageConfig};
use crate::catalog::Database;
use crate::object_store::LocalStore;
use crate::AppState;

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let uploads_dir = temp_dir.path().join("uploads");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            local_storage_path: uploads_dir.to_string_lossy().to_string(),
            ..StorageConfig::default()
        },
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
        max_body_size: 100 * 1024 * 1024,
        ffmpeg_path: "ffmpeg".to_string(),
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let object_store = LocalStore::new(&uploads_dir).expect("Failed to create test object store");

    Arc::new(AppState {
        config,
        db,
        object_store: Arc::new(object_store),
    })
}
