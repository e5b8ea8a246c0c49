use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{ObjectStore, UploadOptions};

/// Object store backed by the hosted provider's storage REST API.
///
/// Uploads go to `POST {endpoint}/storage/v1/object/{bucket}/{key}`; public
/// objects are served from `{endpoint}/storage/v1/object/public/{bucket}/{key}`.
pub struct HostedObjectStore {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl HostedObjectStore {
    pub fn new(http: Client, endpoint: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for HostedObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &ObjectKey,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{bucket}/{key}", self.endpoint);
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(CACHE_CONTROL, format!("max-age={}", options.cache_control_secs))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let message = res.text().await.unwrap_or_default();
        tracing::warn!(bucket, key = %key, status = status.as_u16(), "storage upload rejected");
        Err(StorageError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn public_url(&self, bucket: &str, key: &ObjectKey) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.endpoint)
    }
}
