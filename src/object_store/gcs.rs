use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;

use super::{sanitize_file_name, ObjectStore, ObjectStoreError, StoredObject};

/// Logical namespace all lesson media lands under in the bucket.
const OBJECT_PREFIX: &str = "lessons";

/// Google Cloud Storage backend.
///
/// Construction never fails: missing bucket or credentials produce a startup
/// warning, and every subsequent store/delete call returns a legible
/// `Backend` error instead. The process must stay up either way.
pub struct GcsStore {
    bucket: Option<String>,
    client: Client,
    access_token: tokio::sync::RwLock<String>,
    credentials_file: Option<String>,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GcsStore {
    pub async fn new(bucket: Option<&str>, credentials_file: Option<&str>) -> Self {
        let client = Client::builder().build().unwrap_or_default();

        let store = Self {
            bucket: bucket.map(|s| s.to_string()),
            client,
            access_token: tokio::sync::RwLock::new(String::new()),
            credentials_file: credentials_file.map(|s| s.to_string()),
        };

        if store.bucket.is_none() {
            tracing::warn!(
                "GCS backend selected but GCS_BUCKET is not set; uploads and deletes will fail"
            );
        } else if let Err(e) = store.refresh_token().await {
            tracing::warn!(error = %e, "GCS credentials unavailable at startup; calls will fail until they resolve");
        }

        store
    }

    fn bucket(&self) -> Result<&str, ObjectStoreError> {
        self.bucket
            .as_deref()
            .ok_or_else(|| ObjectStoreError::Backend("GCS bucket is not configured".to_string()))
    }

    /// Drop the cached token so the next call fetches a fresh one. Used when
    /// the backend rejects a token that has passed its expiry.
    async fn invalidate_token(&self) {
        self.access_token.write().await.clear();
    }

    /// Get a usable access token, refreshing if none is cached yet.
    async fn token(&self) -> Result<String, ObjectStoreError> {
        {
            let token = self.access_token.read().await;
            if !token.is_empty() {
                return Ok(token.clone());
            }
        }
        self.refresh_token()
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("GCS credentials unavailable: {e}")))?;
        Ok(self.access_token.read().await.clone())
    }

    async fn refresh_token(&self) -> Result<(), anyhow::Error> {
        let token = if let Some(ref creds_path) = self.credentials_file {
            self.token_from_service_account(creds_path).await?
        } else {
            self.token_from_metadata_server().await?
        };

        let mut lock = self.access_token.write().await;
        *lock = token;
        Ok(())
    }

    async fn token_from_service_account(&self, path: &str) -> Result<String, anyhow::Error> {
        let key_json = tokio::fs::read_to_string(path).await?;
        let key: ServiceAccountKey = serde_json::from_str(&key_json)?;

        let now = chrono::Utc::now().timestamp();
        let claims = serde_json::json!({
            "iss": key.client_email,
            "scope": "https://www.googleapis.com/auth/devstorage.read_write",
            "aud": key.token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        // Build JWT (header.claims.signature)
        let header = base64_url_encode(&serde_json::to_vec(&serde_json::json!({
            "alg": "RS256",
            "typ": "JWT"
        }))?);
        let payload = base64_url_encode(&serde_json::to_vec(&claims)?);
        let unsigned = format!("{header}.{payload}");

        let signature = sign_rs256(unsigned.as_bytes(), &key.private_key)?;
        let jwt = format!("{unsigned}.{}", base64_url_encode(&signature));

        let resp: TokenResponse = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(resp.access_token)
    }

    async fn token_from_metadata_server(&self) -> Result<String, anyhow::Error> {
        let resp: TokenResponse = self
            .client
            .get("http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token")
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .json()
            .await?;

        Ok(resp.access_token)
    }

    /// Object key: fixed namespace, upload timestamp, sanitized client name.
    fn object_key(&self, file_name: &str) -> String {
        format!(
            "{OBJECT_PREFIX}/{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_file_name(file_name)
        )
    }

    fn upload_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{bucket}/o?uploadType=media&name={}",
            urlencode(key)
        )
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://storage.googleapis.com/{bucket}/{key}")
    }

    fn delete_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "https://storage.googleapis.com/storage/v1/b/{bucket}/o/{}",
            urlencode(key)
        )
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        data: Bytes,
        token: &str,
    ) -> Result<reqwest::Response, ObjectStoreError> {
        self.client
            .post(self.upload_url(bucket, key))
            .bearer_auth(token)
            .header("Content-Type", content_type.to_string())
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        token: &str,
    ) -> Result<reqwest::Response, ObjectStoreError> {
        self.client
            .delete(self.delete_url(bucket, key))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, ObjectStoreError> {
        let bucket = self.bucket()?.to_string();
        let token = self.token().await?;
        let key = self.object_key(file_name);

        let mut resp = self
            .put_object(&bucket, &key, content_type, data.clone(), &token)
            .await?;

        // An expired cached token comes back as 401; refresh and retry once
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            let token = self.token().await?;
            resp = self
                .put_object(&bucket, &key, content_type, data, &token)
                .await?;
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "GCS upload failed ({status}): {body}"
            )));
        }

        Ok(StoredObject {
            public_url: self.public_url(&bucket, &key),
            external_ref: key,
        })
    }

    async fn delete(&self, external_ref: &str) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket()?.to_string();
        let token = self.token().await?;

        let mut resp = self.delete_object(&bucket, external_ref, &token).await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            let token = self.token().await?;
            resp = self.delete_object(&bucket, external_ref, &token).await?;
        }

        // 404 is fine -- object already gone
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "GCS delete failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}

/// Percent-encode an object key for use in a URL path or query component.
fn urlencode(key: &str) -> String {
    key.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn sign_rs256(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, anyhow::Error> {
    // Strip PEM headers and decode base64
    let der_b64: String = private_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    let der = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &der_b64)?;

    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| anyhow::anyhow!("Failed to parse RSA key: {e}"))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign: {e}"))?;

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalidation_drops_the_cached_token() {
        // No bucket: construction skips the startup token fetch
        let store = GcsStore::new(None, None).await;
        *store.access_token.write().await = "stale-token".to_string();

        store.invalidate_token().await;
        assert!(store.access_token.read().await.is_empty());
    }
}
