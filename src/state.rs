use crate::config::AppConfig;
use crate::storage::{JsonFileStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = JsonFileStore::new(&config.users_file);
        tracing::info!(path = %store.path().display(), "using user records file");

        Ok(Self::from_parts(config, Arc::new(store) as Arc<dyn UserStore>))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        Self { config, store }
    }

    /// State backed by the given records file, with default server settings.
    #[cfg(test)]
    pub fn with_file(path: std::path::PathBuf) -> Self {
        use crate::config::ServerConfig;

        let config = Arc::new(AppConfig {
            users_file: path.clone(),
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        });
        let store = Arc::new(JsonFileStore::new(path)) as Arc<dyn UserStore>;
        Self::from_parts(config, store)
    }
}
