// src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::sales::{InvoiceEngine, PgSalesStore};

#[derive(Clone)]
pub struct AppState {
    /// Plain reads (listings, product maintenance).
    pub db_pool: PgPool,
    /// Every stock-moving sale operation goes through here.
    pub engine: InvoiceEngine,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: &Config) -> Self {
        let store = Arc::new(PgSalesStore::new(db_pool.clone()));
        Self {
            engine: InvoiceEngine::new(store, config.tx_timeout),
            db_pool,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
        }
    }
}
