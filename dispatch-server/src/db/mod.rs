//! Database Module
//!
//! Embedded SurrealDB storage (RocksDB on disk, Mem for tests)

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

const NAMESPACE: &str = "dispatch";
const DATABASE: &str = "dispatch";

/// Database service - owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the on-disk database and apply schema definitions
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;
        Self::init(db).await
    }

    /// In-memory database for tests
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {e}")))?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::Database(format!("Failed to select namespace: {e}")))?;

        db.query(
            "DEFINE TABLE IF NOT EXISTS order SCHEMALESS;
             DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
             DEFINE TABLE IF NOT EXISTS delivery_agent SCHEMALESS;
             DEFINE TABLE IF NOT EXISTS shop SCHEMALESS;
             DEFINE TABLE IF NOT EXISTS sequence SCHEMALESS;
             DEFINE INDEX IF NOT EXISTS order_code ON TABLE order FIELDS code;
             DEFINE INDEX IF NOT EXISTS order_agent ON TABLE order FIELDS delivery_agent;",
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to apply schema: {e}")))?;

        tracing::info!("Database ready (embedded SurrealDB)");
        Ok(Self { db })
    }
}
