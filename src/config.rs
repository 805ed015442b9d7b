use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    /// Maximum size of a single uploaded file, in bytes
    pub max_upload_size: u64,
    /// Maximum size of a whole request body, in bytes. Must leave headroom
    /// over `max_upload_size` so a multi-file batch is not cut off before
    /// per-file validation runs.
    pub max_body_size: u64,
    /// ffmpeg binary used for video transcoding
    pub ffmpeg_path: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Directory holding the catalog database
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Uploads root for the local backend
    pub local_storage_path: String,
    /// GCS bucket name (required for the gcs backend; its absence degrades
    /// to per-call failure rather than refusing to start)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON (optional, defaults to the metadata server)
    pub gcs_credentials_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./uploads".to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let max_upload_size: u64 = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100 * 1024 * 1024); // 100MB

        let max_body_size = std::env::var("MAX_BODY_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| max_upload_size.saturating_mul(10));

        let ffmpeg_path = std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./uploads".to_string());

        let gcs_bucket = std::env::var("GCS_BUCKET").ok();
        let gcs_credentials_file = std::env::var("GCS_CREDENTIALS_FILE").ok();

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                backend: storage_backend,
                local_storage_path,
                gcs_bucket,
                gcs_credentials_file,
            },
            max_upload_size,
            max_body_size,
            ffmpeg_path,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::ValidationError(
                "BIND_ADDRESS cannot be empty".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.max_body_size < self.max_upload_size {
            return Err(ConfigError::ValidationError(
                "MAX_BODY_SIZE must be at least MAX_UPLOAD_SIZE".to_string(),
            ));
        }

        // A missing bucket must not stop the process; the store degrades to
        // explicit per-call failure instead.
        if matches!(self.storage.backend, StorageBackend::Gcs) && self.storage.gcs_bucket.is_none()
        {
            tracing::warn!(
                "STORAGE_BACKEND=gcs but GCS_BUCKET is not set; store and delete calls will fail"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                bind_address: "127.0.0.1:8080".to_string(),
                data_dir: "./data".to_string(),
            },
            storage: StorageConfig::default(),
            max_upload_size: 100,
            max_body_size: 1000,
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn body_limit_must_cover_a_single_file() {
        let mut config = base_config();
        config.max_body_size = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_upload_size_is_rejected() {
        let mut config = base_config();
        config.max_upload_size = 0;
        assert!(config.validate().is_err());
    }
}
