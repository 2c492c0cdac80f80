use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};

/// Shared per-request context: the store and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.database_url.as_deref() {
            Some(url) => {
                let pg = PgStore::connect(url, config.max_connections, config.request_timeout).await?;
                pg.migrate().await;
                Arc::new(pg) as Arc<dyn Store>
            }
            None => {
                warn!("DATABASE_URL not set; using the in-memory store, data will not persist");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Ok(Self { store, config })
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Default configuration over an empty in-memory store.
    pub fn fake() -> Self {
        Self::from_parts(Arc::new(MemoryStore::new()), Arc::new(AppConfig::default()))
    }
}
