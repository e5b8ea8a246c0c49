use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::shared::{FieldErrors, optional_text, required_text};
use crate::rows::Row;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// A persisted case study (`case_studies` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CaseStudy {
    pub id: Uuid,
    #[schema(example = "Luxury Rebrand")]
    pub title: String,
    #[schema(example = "Maison Aurelle")]
    pub client: String,
    #[schema(example = "Branding")]
    pub category: String,
    #[schema(example = 2024)]
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCaseStudy {
    pub title: String,
    pub client: String,
    pub category: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
}

impl Row for CaseStudy {
    const TABLE: &'static str = "case_studies";
    type Insert = NewCaseStudy;
}

/// Request body for adding a case study.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CaseStudyForm {
    #[serde(default)]
    #[schema(example = "Luxury Rebrand")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "Maison Aurelle")]
    pub client: String,
    #[serde(default)]
    #[schema(example = "Branding")]
    pub category: String,
    #[schema(example = 2024)]
    pub year: Option<i32>,
    pub overview: Option<String>,
}

pub fn validate_case_study(form: &CaseStudyForm) -> Result<NewCaseStudy, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required_text(&mut errors, "title", "Title", &form.title);
    let client = required_text(&mut errors, "client", "Client", &form.client);
    let category = required_text(&mut errors, "category", "Category", &form.category);

    if let Some(year) = form.year
        && !(MIN_YEAR..=MAX_YEAR).contains(&year)
    {
        errors.push("year", format!("Year must be between {MIN_YEAR} and {MAX_YEAR}"));
    }

    errors.finish(|| NewCaseStudy {
        title,
        client,
        category,
        year: form.year,
        overview: optional_text(form.overview.as_deref()),
    })
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CaseStudyListResponse {
    pub case_studies: Vec<CaseStudy>,
    pub total: u64,
    pub stale: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CaseStudySubmissionResponse {
    #[schema(example = "Case study added successfully!")]
    pub message: String,
    pub case_study: CaseStudy,
    pub case_studies: Vec<CaseStudy>,
}
