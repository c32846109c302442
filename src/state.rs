use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::api::models::{FitnessTask, Post};
use crate::api::ApiClient;
use crate::auth::Session;
use crate::cache::FetchCache;
use crate::config::Config;
use crate::db::{self, LocalStore, SqliteLocalStore};
use crate::nav::Navigator;
use crate::notice::Notifier;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Everything a view needs, built once and passed down explicitly.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn LocalStore>,
    pub navigator: Navigator,
    pub notifier: Notifier,
    pub client: ApiClient,
    pub session: Session,
    pub posts: Arc<FetchCache<Vec<Post>>>,
    pub tasks: Arc<FetchCache<Vec<FitnessTask>>>,
    pub avatars: Arc<FetchCache<String>>,
}

impl AppContext {
    /// Open the on-disk store named by the config and restore the session.
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        let pool = db::create_pool(&config.store_path())?;
        db::run_migrations(&pool)?;
        Self::with_store(config, Arc::new(SqliteLocalStore::new(pool))).await
    }

    pub async fn with_store(config: Config, store: Arc<dyn LocalStore>) -> anyhow::Result<Self> {
        let navigator = Navigator::new();
        let notifier = Notifier::new(config.notice_duration());
        let session = Session::restore(store.clone(), navigator.clone()).await?;
        let client = ApiClient::new(
            &config.api.base_url,
            config.request_timeout(),
            session.clone(),
        )?;
        let window = config.dedup_window();

        Ok(Self {
            config,
            store,
            navigator,
            notifier,
            client,
            session,
            posts: Arc::new(FetchCache::new(window)),
            tasks: Arc::new(FetchCache::new(window)),
            avatars: Arc::new(FetchCache::new(window)),
        })
    }
}
