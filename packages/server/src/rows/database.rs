use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use super::{RowStore, RowStoreError};
use crate::entity::{case_study, showcase_item, video};
use crate::models::case_study::{CaseStudy, NewCaseStudy};
use crate::models::media::{Category, MediaAsset, NewMediaAsset};
use crate::models::showcase::{NewShowcaseItem, ShowcaseItem, ShowcaseKind};

/// Row store talking to the database directly through SeaORM.
///
/// Assigns ids (UUIDv7) and creation timestamps itself, the way the hosted
/// row store does server-side.
#[derive(Clone)]
pub struct DatabaseRowStore {
    db: DatabaseConnection,
}

impl DatabaseRowStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn video_from_model(m: video::Model) -> Result<MediaAsset, RowStoreError> {
    let category = m.category.parse::<Category>().map_err(|_| {
        RowStoreError::Malformed(format!("video {} has unknown category {:?}", m.id, m.category))
    })?;
    Ok(MediaAsset {
        id: m.id,
        title: m.title,
        description: m.description,
        category,
        video_url: m.video_url,
        thumbnail_url: m.thumbnail_url,
        created_at: m.created_at,
    })
}

fn case_study_from_model(m: case_study::Model) -> CaseStudy {
    CaseStudy {
        id: m.id,
        title: m.title,
        client: m.client,
        category: m.category,
        year: m.year,
        overview: m.overview,
        created_at: m.created_at,
    }
}

fn showcase_from_model(m: showcase_item::Model) -> Result<ShowcaseItem, RowStoreError> {
    let item_type = ShowcaseKind::from_column(&m.item_type).ok_or_else(|| {
        RowStoreError::Malformed(format!(
            "showcase item {} has unknown type {:?}",
            m.id, m.item_type
        ))
    })?;
    Ok(ShowcaseItem {
        id: m.id,
        title: m.title,
        description: m.description,
        item_type,
        media_url: m.media_url,
        category: m.category,
        created_at: m.created_at,
    })
}

#[async_trait]
impl RowStore<MediaAsset> for DatabaseRowStore {
    async fn insert(&self, row: NewMediaAsset) -> Result<MediaAsset, RowStoreError> {
        let model = video::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(row.title),
            description: Set(row.description),
            category: Set(row.category.as_str().to_string()),
            video_url: Set(row.video_url),
            thumbnail_url: Set(row.thumbnail_url),
            created_at: Set(Utc::now()),
        };
        video_from_model(model.insert(&self.db).await?)
    }

    async fn list_newest_first(&self) -> Result<Vec<MediaAsset>, RowStoreError> {
        video::Entity::find()
            .order_by_desc(video::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(video_from_model)
            .collect()
    }
}

#[async_trait]
impl RowStore<CaseStudy> for DatabaseRowStore {
    async fn insert(&self, row: NewCaseStudy) -> Result<CaseStudy, RowStoreError> {
        let model = case_study::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(row.title),
            client: Set(row.client),
            category: Set(row.category),
            year: Set(row.year),
            overview: Set(row.overview),
            created_at: Set(Utc::now()),
        };
        Ok(case_study_from_model(model.insert(&self.db).await?))
    }

    async fn list_newest_first(&self) -> Result<Vec<CaseStudy>, RowStoreError> {
        let rows = case_study::Entity::find()
            .order_by_desc(case_study::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(case_study_from_model).collect())
    }
}

#[async_trait]
impl RowStore<ShowcaseItem> for DatabaseRowStore {
    async fn insert(&self, row: NewShowcaseItem) -> Result<ShowcaseItem, RowStoreError> {
        let model = showcase_item::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(row.title),
            description: Set(row.description),
            item_type: Set(row.item_type.as_str().to_string()),
            media_url: Set(row.media_url),
            category: Set(row.category),
            created_at: Set(Utc::now()),
        };
        showcase_from_model(model.insert(&self.db).await?)
    }

    async fn list_newest_first(&self) -> Result<Vec<ShowcaseItem>, RowStoreError> {
        showcase_item::Entity::find()
            .order_by_desc(showcase_item::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(showcase_from_model)
            .collect()
    }
}
