//! Order Code Sequence
//!
//! A dedicated atomic counter record replaces the original max+1 query with
//! collision retry - the increment is a single UPSERT, so two concurrent
//! checkouts can never draw the same code.

use super::{BaseRepository, RepoResult};
use chrono::Utc;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Debug, Deserialize)]
struct Sequence {
    value: i64,
}

#[derive(Clone)]
pub struct SequenceRepository {
    base: BaseRepository,
}

impl SequenceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Draw the next order code, e.g. "ORD20250118100042"
    pub async fn next_order_code(&self) -> RepoResult<String> {
        let rows: Vec<Sequence> = self
            .base
            .db()
            .query("UPSERT sequence:order_code SET value = (value ?? 0) + 1 RETURN AFTER")
            .await?
            .take(0)?;
        let seq = rows
            .into_iter()
            .next()
            .map(|s| s.value)
            .ok_or_else(|| super::RepoError::Database("sequence counter unavailable".into()))?;
        let date_str = Utc::now().format("%Y%m%d").to_string();
        Ok(format!("ORD{}{}", date_str, 100000 + seq))
    }
}
