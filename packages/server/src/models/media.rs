use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::shared::{FieldErrors, check_http_url, optional_text, required_text};
use crate::rows::Row;
use crate::utils::filename::{MediaKind, validate_media_filename};

/// Portfolio category of a video.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
pub enum Category {
    Videography,
    Animation,
    #[serde(rename = "CGI")]
    Cgi,
    Reels,
    #[serde(rename = "UI/UX")]
    UiUx,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Videography,
        Category::Animation,
        Category::Cgi,
        Category::Reels,
        Category::UiUx,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Videography => "Videography",
            Category::Animation => "Animation",
            Category::Cgi => "CGI",
            Category::Reels => "Reels",
            Category::UiUx => "UI/UX",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
                format!("Category must be one of: {}", names.join(", "))
            })
    }
}

/// A persisted video in the portfolio (`videos` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MediaAsset {
    pub id: Uuid,
    #[schema(example = "Launch Film")]
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    /// Public address of the video.
    #[schema(example = "https://project.example.co/storage/v1/object/public/videos/1718000000000-k3j9x0a.mp4")]
    pub video_url: String,
    /// Public address of the thumbnail image, if any.
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Column values for a new `videos` row. The row store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMediaAsset {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
}

impl Row for MediaAsset {
    const TABLE: &'static str = "videos";
    type Insert = NewMediaAsset;
}

/// A file picked on the client and sent with the submission.
#[derive(Clone, PartialEq)]
pub struct LocalFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Where a video or thumbnail comes from. A slot holds at most one source.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    File(LocalFile),
    Url(String),
}

/// Form state of the "add video" submission.
///
/// The video and thumbnail slots are mutually exclusive between a local file
/// and a URL: choosing one replaces the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionForm {
    pub title: String,
    pub description: String,
    pub category: String,
    video: Option<MediaSource>,
    thumbnail: Option<MediaSource>,
}

impl SubmissionForm {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Pick (or clear, with `None`) the local video file; clears any video URL.
    pub fn select_video_file(&mut self, file: Option<LocalFile>) {
        self.video = file.map(MediaSource::File);
    }

    /// Enter a video URL; clears any selected video file. Blank input leaves the slot empty.
    pub fn set_video_url(&mut self, url: &str) {
        self.video = non_blank(url).map(MediaSource::Url);
    }

    /// Pick (or clear) the local thumbnail file; clears any thumbnail URL.
    pub fn select_thumbnail_file(&mut self, file: Option<LocalFile>) {
        self.thumbnail = file.map(MediaSource::File);
    }

    /// Enter a thumbnail URL; clears any selected thumbnail file.
    pub fn set_thumbnail_url(&mut self, url: &str) {
        self.thumbnail = non_blank(url).map(MediaSource::Url);
    }

    pub fn video(&self) -> Option<&MediaSource> {
        self.video.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&MediaSource> {
        self.thumbnail.as_ref()
    }

    pub fn video_file(&self) -> Option<&LocalFile> {
        match &self.video {
            Some(MediaSource::File(f)) => Some(f),
            _ => None,
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        match &self.video {
            Some(MediaSource::Url(u)) => Some(u),
            _ => None,
        }
    }

    pub fn thumbnail_file(&self) -> Option<&LocalFile> {
        match &self.thumbnail {
            Some(MediaSource::File(f)) => Some(f),
            _ => None,
        }
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        match &self.thumbnail {
            Some(MediaSource::Url(u)) => Some(u),
            _ => None,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A file that passed validation, with the MIME type to upload it under.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedFile {
    pub file: LocalFile,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckedSource {
    File(CheckedFile),
    Url(String),
}

/// A submission that passed validation and may be handed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub video: CheckedSource,
    pub thumbnail: Option<CheckedSource>,
}

/// Validate the form without touching any external service.
pub fn validate_submission(form: &SubmissionForm) -> Result<ValidSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = required_text(&mut errors, "title", "Title", &form.title);

    let category = match form.category.trim() {
        "" => {
            errors.push("category", "Category is required");
            None
        }
        raw => match raw.parse::<Category>() {
            Ok(c) => Some(c),
            Err(msg) => {
                errors.push("category", msg);
                None
            }
        },
    };

    let video = match form.video() {
        None => {
            errors.push("video", "Please provide either a video file or video URL");
            None
        }
        Some(source) => check_source(&mut errors, "video", "Video URL", MediaKind::Video, source),
    };

    let thumbnail = form.thumbnail().and_then(|source| {
        check_source(
            &mut errors,
            "thumbnail",
            "Thumbnail URL",
            MediaKind::Image,
            source,
        )
    });

    if !errors.is_empty() {
        return Err(errors);
    }

    match (category, video) {
        (Some(category), Some(video)) => Ok(ValidSubmission {
            title,
            description: optional_text(Some(&form.description)),
            category,
            video,
            thumbnail,
        }),
        _ => Err(errors),
    }
}

fn check_source(
    errors: &mut FieldErrors,
    field: &'static str,
    url_label: &str,
    kind: MediaKind,
    source: &MediaSource,
) -> Option<CheckedSource> {
    match source {
        MediaSource::Url(url) => {
            let before = errors.iter().count();
            check_http_url(errors, field, url_label, url);
            (errors.iter().count() == before).then(|| CheckedSource::Url(url.clone()))
        }
        MediaSource::File(file) => {
            if file.data.is_empty() {
                errors.push(field, "Selected file is empty");
                return None;
            }
            match validate_media_filename(&file.file_name, kind) {
                Ok(content_type) => Some(CheckedSource::File(CheckedFile {
                    file: file.clone(),
                    content_type,
                })),
                Err(e) => {
                    errors.push(field, e.message());
                    None
                }
            }
        }
    }
}

/// Query parameters for the public video listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct VideoListQuery {
    /// A category name, or `All` for every category.
    #[param(example = "Animation")]
    pub category: Option<String>,
}

/// Parse the category filter; `None` means every category.
pub fn parse_category_filter(raw: Option<&str>) -> Result<Option<Category>, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("All") => Ok(None),
        Some(name) => name.parse().map(Some),
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoListResponse {
    pub videos: Vec<MediaAsset>,
    pub total: u64,
    /// True when the row store could not be reached and the last known listing is served.
    pub stale: bool,
}

/// Result of a successful submission.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoSubmissionResponse {
    #[schema(example = "Video added successfully!")]
    pub message: String,
    pub video: MediaAsset,
    /// The refreshed listing, newest first.
    pub videos: Vec<MediaAsset>,
}
