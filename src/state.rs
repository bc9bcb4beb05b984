use std::sync::Arc;

use crate::{config::AppConfig, db::DbPool};

/// Shared per-request state: connection pool, outbound HTTP client, config.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub http_client: reqwest::Client,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db_pool: DbPool, http_client: reqwest::Client, config: AppConfig) -> Self {
        Self {
            db_pool,
            http_client,
            config: Arc::new(config),
        }
    }
}
