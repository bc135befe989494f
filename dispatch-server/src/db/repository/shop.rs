//! Shop Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Shop;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const SHOP_TABLE: &str = "shop";

#[derive(Clone)]
pub struct ShopRepository {
    base: BaseRepository,
}

impl ShopRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Shop>> {
        let shop: Option<Shop> = self.base.db().select(id.clone()).await?;
        Ok(shop)
    }

    pub async fn create(&self, shop: Shop) -> RepoResult<Shop> {
        let created: Option<Shop> = self.base.db().create(SHOP_TABLE).content(shop).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create shop".to_string()))
    }

    /// Credit the seller balance - single atomic increment
    pub async fn credit_balance(&self, shop: &RecordId, amount: f64) -> RepoResult<Option<Shop>> {
        let updated: Vec<Shop> = self
            .base
            .db()
            .query("UPDATE $shop SET available_balance += $amount RETURN AFTER")
            .bind(("shop", shop.clone()))
            .bind(("amount", amount))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }
}
