use std::sync::Arc;

use anyhow::Context;
use common::storage::ObjectStore;
use common::storage::filesystem::FilesystemObjectStore;
use common::storage::hosted::HostedObjectStore;
use tracing::{Level, info};

use server::auth::HostedAuth;
use server::build_router;
use server::config::{AppConfig, RowBackend, StorageBackend};
use server::database::init_db;
use server::rows::{DatabaseRowStore, RestRowStore};
use server::state::{AppState, RowStores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Invalid configuration")?;
    let provider = &config.provider;

    let http = reqwest::Client::builder()
        .user_agent(concat!("studio-server/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let auth = Arc::new(HostedAuth::new(
        http.clone(),
        &provider.url,
        provider.anon_key.clone(),
        provider.jwt_secret.clone(),
    ));

    let objects: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Hosted => Arc::new(HostedObjectStore::new(
            http.clone(),
            &provider.url,
            provider.write_key(),
        )),
        StorageBackend::Filesystem => {
            let fs = &config.storage.filesystem;
            info!("Storing uploads under {}", fs.root.display());
            Arc::new(
                FilesystemObjectStore::new(
                    fs.root.clone(),
                    fs.public_base_url.clone(),
                    config.storage.max_upload_size,
                )
                .await?,
            )
        }
    };

    let rows = match config.rows.backend {
        RowBackend::Hosted => RowStores::shared(RestRowStore::new(
            http.clone(),
            &provider.url,
            provider.write_key(),
        )),
        RowBackend::Database => {
            let url = config.rows.database_url.as_deref().unwrap_or_default();
            let db = init_db(url).await.context("Failed to connect to database")?;
            info!("Database schema synced");
            RowStores::shared(DatabaseRowStore::new(db))
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, auth, objects, rows);
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/swagger-ui and http://{}/scalar", addr, addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
