use std::sync::Arc;

use common::storage::ObjectStore;

use crate::auth::AuthProvider;
use crate::config::AppConfig;
use crate::listing::Listing;
use crate::models::case_study::CaseStudy;
use crate::models::media::MediaAsset;
use crate::models::showcase::ShowcaseItem;
use crate::rows::RowStore;
use crate::session::SessionGuard;

/// Row stores for every table the server lists.
pub struct RowStores {
    pub videos: Arc<dyn RowStore<MediaAsset>>,
    pub case_studies: Arc<dyn RowStore<CaseStudy>>,
    pub showcase: Arc<dyn RowStore<ShowcaseItem>>,
}

impl RowStores {
    /// Use one store value for all tables.
    pub fn shared<S>(store: S) -> Self
    where
        S: RowStore<MediaAsset> + RowStore<CaseStudy> + RowStore<ShowcaseItem> + 'static,
    {
        let store = Arc::new(store);
        Self {
            videos: store.clone(),
            case_studies: store.clone(),
            showcase: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: Arc<SessionGuard>,
    pub objects: Arc<dyn ObjectStore>,
    pub videos: Arc<Listing<MediaAsset>>,
    pub case_studies: Arc<Listing<CaseStudy>>,
    pub showcase: Arc<Listing<ShowcaseItem>>,
}

impl AppState {
    /// Wire the boundaries together. Must run inside a tokio runtime, since
    /// the session guard starts its event listener here.
    pub fn new(
        config: AppConfig,
        auth: Arc<dyn AuthProvider>,
        objects: Arc<dyn ObjectStore>,
        rows: RowStores,
    ) -> Self {
        let sessions = SessionGuard::spawn(auth.clone(), config.admin.login_path.clone());
        Self {
            config: Arc::new(config),
            auth,
            sessions,
            objects,
            videos: Arc::new(Listing::new(rows.videos)),
            case_studies: Arc::new(Listing::new(rows.case_studies)),
            showcase: Arc::new(Listing::new(rows.showcase)),
        }
    }
}
