use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{case_study, showcase_item, video};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    ensure_indexes(&db).await;

    Ok(db)
}

/// Create the `created_at` indexes that back the newest-first listings.
///
/// Schema sync does not create non-unique indexes, so they are issued here.
/// Failures are logged and do not stop startup.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    let statements = [
        (
            "idx_videos_created_at",
            Index::create()
                .if_not_exists()
                .name("idx_videos_created_at")
                .table(video::Entity)
                .col(video::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_case_studies_created_at",
            Index::create()
                .if_not_exists()
                .name("idx_case_studies_created_at")
                .table(case_study::Entity)
                .col(case_study::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_showcase_items_created_at",
            Index::create()
                .if_not_exists()
                .name("idx_showcase_items_created_at")
                .table(showcase_item::Entity)
                .col(showcase_item::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in statements {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }
}
