use std::sync::Arc;

use crate::auth::sessions::SessionStore;
use crate::chatbot::llm::LlmClient;
use crate::config::{AppConfig, StoreBackend};
use crate::store::{JsonStore, SqliteStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<AppConfig>,
    pub llm: Option<Arc<LlmClient>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = match config.backend {
            StoreBackend::Json => Arc::new(JsonStore::open(config.data_file.clone()).await?),
            StoreBackend::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
        };

        Self::from_parts(store, config)
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let llm = config
            .chatbot
            .as_ref()
            .map(LlmClient::new)
            .transpose()?
            .map(Arc::new);
        Ok(Self {
            store,
            sessions: Arc::new(SessionStore::default()),
            config,
            llm,
        })
    }
}
