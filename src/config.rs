use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Whole-document JSON file (the default).
    Json,
    /// Relational tables over sqlite.
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub data_file: PathBuf,
    pub database_url: String,
    pub retention_days: i64,
    /// When set, /api/chatbot is answered by the upstream language model
    /// instead of the built-in rule table.
    pub chatbot: Option<ChatbotConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "json".into())
            .as_str()
        {
            "json" => StoreBackend::Json,
            "sqlite" => StoreBackend::Sqlite,
            other => anyhow::bail!("unknown STORE_BACKEND {other:?} (expected json or sqlite)"),
        };

        let chatbot = std::env::var("CHATBOT_API_URL")
            .ok()
            .map(|api_url| ChatbotConfig {
                api_url,
                api_key: std::env::var("CHATBOT_API_KEY").ok(),
                model: std::env::var("CHATBOT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            });

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            backend,
            data_file: std::env::var("DATA_FILE")
                .unwrap_or_else(|_| "data.json".into())
                .into(),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:taskmind.db".into()),
            retention_days: std::env::var("RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
            chatbot,
        })
    }

    /// Config for in-process tests: JSON backend rooted at `data_file`,
    /// default retention, no upstream chatbot.
    pub fn for_tests(data_file: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            backend: StoreBackend::Json,
            data_file,
            database_url: "sqlite::memory:".into(),
            retention_days: 30,
            chatbot: None,
        }
    }
}
