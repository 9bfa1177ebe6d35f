pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use config::AppConfig;
use repositories::SqliteHandlerRepository;
use services::{HttpReachabilityChecker, RegistryService};

#[derive(Clone)]
pub struct AppState {
    pub registry_service: Arc<RegistryService>,
}

impl AppState {
    /// Wire the SQLite store, HTTP checker and registry service together.
    ///
    /// The checker and the proxy share one `reqwest::Client` (and its
    /// connection pool).
    pub fn new(pool: sqlx::SqlitePool, config: &AppConfig) -> Self {
        let client = reqwest::Client::new();

        let repository = Arc::new(SqliteHandlerRepository::with_timeout(
            pool,
            config.store_timeout,
        ));
        let checker = Arc::new(HttpReachabilityChecker::new(
            client.clone(),
            config.probe_timeout,
        ));

        let registry_service = Arc::new(RegistryService::new(
            repository,
            checker,
            client,
            config.proxy_timeout,
        ));

        Self { registry_service }
    }
}
