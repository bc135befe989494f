//! Product Repository
//!
//! Stock and sold-count adjustments are single atomic statements, never
//! two round trips - concurrent placements and cancellations against the
//! same product cannot lose updates.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Product;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select(id.clone()).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, product: Product) -> RepoResult<Product> {
        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Reserve stock for an order line: stock down, sold-count up.
    /// Returns None when the product no longer exists.
    pub async fn deduct_stock(
        &self,
        product: &RecordId,
        quantity: u32,
    ) -> RepoResult<Option<Product>> {
        let updated: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $product SET stock -= $qty, sold_count += $qty RETURN AFTER")
            .bind(("product", product.clone()))
            .bind(("qty", quantity as i64))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Compensation: stock back up, sold-count back down floored at zero.
    /// Returns None when the product no longer exists.
    pub async fn restore_stock(
        &self,
        product: &RecordId,
        quantity: u32,
    ) -> RepoResult<Option<Product>> {
        let updated: Vec<Product> = self
            .base
            .db()
            .query(
                "UPDATE $product SET stock += $qty, \
                 sold_count = math::max([sold_count - $qty, 0]) \
                 RETURN AFTER",
            )
            .bind(("product", product.clone()))
            .bind(("qty", quantity as i64))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }
}
