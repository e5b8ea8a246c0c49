use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{ObjectStore, UploadOptions};

/// Filesystem-backed object store for local development.
///
/// Objects live at `{base_path}/{bucket}/{key}` and are expected to be served
/// by the HTTP layer under `public_base_url`, so the public address of an
/// object is `{public_base_url}/{bucket}/{key}`.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        // Bucket names follow the same flat-name rules as keys.
        ObjectKey::parse(bucket)
            .map_err(|_| StorageError::InvalidKey(format!("invalid bucket name: {bucket}")))?;
        Ok(self.base_path.join(bucket))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &ObjectKey,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        if body.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: body.len() as u64,
                limit: self.max_size,
            });
        }

        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await?;
        let object_path = dir.join(key.as_str());

        if !options.upsert && fs::try_exists(&object_path).await? {
            return Err(StorageError::AlreadyExists(format!("{bucket}/{key}")));
        }

        let temp_path = self.temp_path();
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&body).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(())
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(bucket, key = %key, size = body.len(), "stored object on disk");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &ObjectKey) -> String {
        format!("{}/{bucket}/{key}", self.public_base_url)
    }
}
