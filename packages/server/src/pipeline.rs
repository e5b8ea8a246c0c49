//! The "add video" submission: upload files, persist the row, refresh the listing.

use std::fmt;

use common::storage::{ObjectKey, ObjectStore, StorageError, UploadOptions};
use tracing::{error, info, warn};

use crate::config::StorageConfig;
use crate::error::AppError;
use crate::listing::{Listing, Refreshed};
use crate::models::media::{
    CheckedFile, CheckedSource, MediaAsset, NewMediaAsset, SubmissionForm, validate_submission,
};
use crate::models::shared::FieldErrors;
use crate::rows::RowStoreError;

const THUMBNAIL_KEY_PREFIX: &str = "thumb-";

/// Step of a submission in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    UploadingVideo,
    UploadingThumbnail,
    PersistingRow,
    RefreshingList,
    Complete,
}

impl PipelineStage {
    /// Rough completion percentage shown while the stage runs.
    pub fn progress(self) -> u8 {
        match self {
            PipelineStage::Idle => 0,
            PipelineStage::UploadingVideo => 10,
            PipelineStage::UploadingThumbnail => 60,
            PipelineStage::PersistingRow => 80,
            PipelineStage::RefreshingList => 90,
            PipelineStage::Complete => 100,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::UploadingVideo => "uploading video",
            PipelineStage::UploadingThumbnail => "uploading thumbnail",
            PipelineStage::PersistingRow => "persisting row",
            PipelineStage::RefreshingList => "refreshing list",
            PipelineStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub enum PipelineFailure {
    Validation(FieldErrors),
    Upload(StorageError),
    /// Neither an upload nor the form produced a video address.
    MissingVideoAddress,
    Persist(RowStoreError),
}

/// A failed submission and the stage it failed in.
#[derive(Debug)]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub failure: PipelineFailure,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            PipelineFailure::Validation(errors) => write!(f, "invalid submission: {}", errors.summary()),
            PipelineFailure::Upload(e) => write!(f, "{} failed: {}", self.stage, e),
            PipelineFailure::MissingVideoAddress => f.write_str("no video address to persist"),
            PipelineFailure::Persist(e) => write!(f, "{} failed: {}", self.stage, e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError {
                failure: PipelineFailure::Validation(errors),
                ..
            } => AppError::InvalidFields(errors),
            err => {
                error!(stage = %err.stage, "Video submission failed: {}", err);
                AppError::Upstream(
                    "Error uploading video. Please check your storage configuration.".into(),
                )
            }
        }
    }
}

/// A successful submission.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub record: MediaAsset,
    pub listing: Refreshed<MediaAsset>,
}

/// Runs submissions against injected storage and listing boundaries.
pub struct MediaUploadPipeline<'a> {
    objects: &'a dyn ObjectStore,
    listing: &'a Listing<MediaAsset>,
    storage: &'a StorageConfig,
}

impl<'a> MediaUploadPipeline<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        listing: &'a Listing<MediaAsset>,
        storage: &'a StorageConfig,
    ) -> Self {
        Self {
            objects,
            listing,
            storage,
        }
    }

    pub async fn run(&self, form: &SubmissionForm) -> Result<PipelineOutcome, PipelineError> {
        self.run_observed(form, &mut |_| {}).await
    }

    /// Run a submission, reporting each stage to `observe` as it starts.
    ///
    /// Validation happens before any external call. A failed thumbnail upload
    /// leaves an already uploaded video in storage.
    pub async fn run_observed(
        &self,
        form: &SubmissionForm,
        observe: &mut (dyn FnMut(PipelineStage) + Send),
    ) -> Result<PipelineOutcome, PipelineError> {
        let valid = validate_submission(form).map_err(|errors| PipelineError {
            stage: PipelineStage::Idle,
            failure: PipelineFailure::Validation(errors),
        })?;

        let video_url = match &valid.video {
            CheckedSource::File(file) => {
                observe(PipelineStage::UploadingVideo);
                self.upload(&self.storage.video_bucket, "", file)
                    .await
                    .map_err(|e| PipelineError {
                        stage: PipelineStage::UploadingVideo,
                        failure: PipelineFailure::Upload(e),
                    })?
            }
            CheckedSource::Url(url) => url.clone(),
        };

        let thumbnail_url = match &valid.thumbnail {
            Some(CheckedSource::File(file)) => {
                observe(PipelineStage::UploadingThumbnail);
                let uploaded = self
                    .upload(&self.storage.image_bucket, THUMBNAIL_KEY_PREFIX, file)
                    .await
                    .map_err(|e| {
                        if matches!(valid.video, CheckedSource::File(_)) {
                            warn!(video_url = %video_url, "Thumbnail upload failed; uploaded video is orphaned");
                        }
                        PipelineError {
                            stage: PipelineStage::UploadingThumbnail,
                            failure: PipelineFailure::Upload(e),
                        }
                    })?;
                Some(uploaded)
            }
            Some(CheckedSource::Url(url)) => Some(url.clone()),
            None => None,
        };

        if video_url.trim().is_empty() {
            return Err(PipelineError {
                stage: PipelineStage::PersistingRow,
                failure: PipelineFailure::MissingVideoAddress,
            });
        }

        observe(PipelineStage::PersistingRow);
        let row = NewMediaAsset {
            title: valid.title,
            description: valid.description,
            category: valid.category,
            video_url,
            thumbnail_url,
        };
        let record = self
            .listing
            .store()
            .insert(row)
            .await
            .map_err(|e| PipelineError {
                stage: PipelineStage::PersistingRow,
                failure: PipelineFailure::Persist(e),
            })?;
        info!(id = %record.id, title = %record.title, "Video added");

        observe(PipelineStage::RefreshingList);
        let listing = self.listing.refresh().await;

        observe(PipelineStage::Complete);
        Ok(PipelineOutcome { record, listing })
    }

    async fn upload(
        &self,
        bucket: &str,
        prefix: &str,
        checked: &CheckedFile,
    ) -> Result<String, StorageError> {
        let key = ObjectKey::generate(prefix, checked.file.file_name.trim());
        let options = UploadOptions {
            cache_control_secs: self.storage.cache_control_secs,
            upsert: false,
            content_type: Some(checked.content_type.clone()),
        };
        self.objects
            .upload(bucket, &key, checked.file.data.clone(), &options)
            .await?;
        info!(%bucket, %key, size = checked.file.data.len(), "Uploaded object");
        Ok(self.objects.public_url(bucket, &key))
    }
}
