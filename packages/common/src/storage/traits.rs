use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;
use super::key::ObjectKey;

/// Per-upload options forwarded to the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// `Cache-Control` max-age in seconds served with the public object.
    pub cache_control_secs: u32,
    /// Replace an existing object under the same key instead of failing.
    pub upsert: bool,
    /// MIME type of the body, if known.
    pub content_type: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            cache_control_secs: 3600,
            upsert: false,
            content_type: None,
        }
    }
}

/// Key-addressed object storage organised in named buckets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key` in `bucket`.
    async fn upload(
        &self,
        bucket: &str,
        key: &ObjectKey,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError>;

    /// Address under which the object can be fetched without authentication.
    ///
    /// This is computed locally and does not check that the object exists.
    fn public_url(&self, bucket: &str, key: &ObjectKey) -> String;
}
