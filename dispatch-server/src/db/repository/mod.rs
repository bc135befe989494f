//! Repository Module
//!
//! Data access for SurrealDB tables. Every contended mutation is a single
//! conditional `UPDATE ... WHERE ... RETURN AFTER` statement, atomic at the
//! storage layer - repositories never do read-then-write.

pub mod delivery_agent;
pub mod order;
pub mod product;
pub mod sequence;
pub mod shop;

// Re-exports
pub use delivery_agent::DeliveryAgentRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use sequence::SequenceRepository;
pub use shop::ShopRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: "table:id" everywhere
// =============================================================================
//
// All IDs are surrealdb::RecordId:
//   - parse: let id: RecordId = "order:abc".parse()?;
//   - build: let id = RecordId::from_table_key("order", "abc");
//   - CRUD:  db.select(id) takes the RecordId directly

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
