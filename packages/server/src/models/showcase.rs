use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::shared::{FieldErrors, check_http_url, optional_text, required_text};
use crate::rows::Row;

/// Kind of media a showcase item points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShowcaseKind {
    #[default]
    Video,
    Image,
}

impl ShowcaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShowcaseKind::Video => "video",
            ShowcaseKind::Image => "image",
        }
    }

    pub fn from_column(s: &str) -> Option<Self> {
        match s {
            "video" => Some(ShowcaseKind::Video),
            "image" => Some(ShowcaseKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ShowcaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted showcase item (`showcase_items` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ShowcaseItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub item_type: ShowcaseKind,
    pub media_url: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewShowcaseItem {
    pub title: String,
    pub description: Option<String>,
    pub item_type: ShowcaseKind,
    pub media_url: String,
    pub category: Option<String>,
}

impl Row for ShowcaseItem {
    const TABLE: &'static str = "showcase_items";
    type Insert = NewShowcaseItem;
}

/// Request body for adding a showcase item.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ShowcaseForm {
    #[serde(default)]
    #[schema(example = "Behind the scenes")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub item_type: ShowcaseKind,
    #[serde(default)]
    #[schema(example = "https://cdn.example.com/bts.mp4")]
    pub media_url: String,
    pub category: Option<String>,
}

pub fn validate_showcase_item(form: &ShowcaseForm) -> Result<NewShowcaseItem, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required_text(&mut errors, "title", "Title", &form.title);

    let media_url = form.media_url.trim().to_string();
    if media_url.is_empty() {
        errors.push("media_url", "Media URL is required");
    } else {
        check_http_url(&mut errors, "media_url", "Media URL", &media_url);
    }

    errors.finish(|| NewShowcaseItem {
        title,
        description: optional_text(form.description.as_deref()),
        item_type: form.item_type,
        media_url,
        category: optional_text(form.category.as_deref()),
    })
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ShowcaseListResponse {
    pub items: Vec<ShowcaseItem>,
    pub total: u64,
    pub stale: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ShowcaseSubmissionResponse {
    #[schema(example = "Showcase item added successfully!")]
    pub message: String,
    pub item: ShowcaseItem,
    pub items: Vec<ShowcaseItem>,
}
