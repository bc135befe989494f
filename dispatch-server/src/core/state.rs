//! Server State
//!
//! [`ServerState`] holds the shared singletons every request handler needs:
//! configuration, the embedded database handle, and the notification
//! gateway. Arc-shared, cheap to clone.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::notify::{HttpNotifier, Notifier};

#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable)
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// External notification gateway
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("db", &"<Surreal>")
            .field("notifier", &"<Notifier>")
            .finish()
    }
}

impl ServerState {
    pub fn new(config: Config, db: Surreal<Db>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            db,
            notifier,
        }
    }

    /// Initialize the production state: work dir, on-disk database, HTTP
    /// notifier against the configured push gateway.
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let db_path = config.database_path();
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        let notifier = Arc::new(HttpNotifier::new(
            config.push_gateway_url.clone(),
            config.notify_timeout_ms,
        ));

        Ok(Self::new(config.clone(), db_service.db, notifier))
    }

    /// In-memory state for tests, with a caller-supplied notifier double
    pub async fn initialize_in_memory(
        config: Config,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let db_service = DbService::memory().await?;
        Ok(Self::new(config, db_service.db, notifier))
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }
}
