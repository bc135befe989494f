//! Order Repository
//!
//! All status mutations are conditional updates with the allowed source
//! statuses in the WHERE clause, so two racing requests can never both
//! observe a stale status. An empty RETURN AFTER result means the guard
//! failed; callers disambiguate with a follow-up read.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{CancelActor, Order, OrderStatus};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a group of orders atomically (one checkout, N shops).
    ///
    /// All records commit or none do.
    pub async fn create_group(&self, orders: Vec<Order>) -> RepoResult<Vec<Order>> {
        if orders.is_empty() {
            return Err(RepoError::Validation("no orders to create".into()));
        }

        let mut statements = vec!["BEGIN TRANSACTION;".to_string()];
        for i in 0..orders.len() {
            statements.push(format!("CREATE order CONTENT $order_{i};"));
        }
        statements.push("COMMIT TRANSACTION;".to_string());
        let sql = statements.join("\n");

        let mut query = self.base.db().query(sql);
        for (i, order) in orders.into_iter().enumerate() {
            query = query.bind((format!("order_{i}"), order));
        }
        let mut result = query.await?;

        let mut created = Vec::new();
        for i in 0..result.num_statements() {
            let batch: Vec<Order> = result.take(i)?;
            created.extend(batch);
        }
        if created.is_empty() {
            return Err(RepoError::Database("order group creation failed".into()));
        }
        Ok(created)
    }

    /// Fetch a single order
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self.base.db().select(id.clone()).await?;
        Ok(order)
    }

    /// All orders ever assigned to an agent, newest first
    pub async fn find_by_agent(&self, agent: &RecordId) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE delivery_agent = $agent ORDER BY created_at DESC")
            .bind(("agent", agent.clone()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Atomic compare-and-set assignment.
    ///
    /// Succeeds only while `delivery_agent` is still unset (or already this
    /// agent) and the status still allows acceptance. Returns the updated
    /// order, or None when the guard failed.
    pub async fn try_assign(
        &self,
        order: &RecordId,
        agent: &RecordId,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET delivery_agent = $agent, status = $status \
                 WHERE (delivery_agent = NONE OR delivery_agent = $agent) \
                 AND status INSIDE $allowed \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("agent", agent.clone()))
            .bind(("status", OrderStatus::OutForDelivery))
            .bind((
                "allowed",
                vec![
                    OrderStatus::Processing,
                    OrderStatus::TransferredToDeliveryPartner,
                ],
            ))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Guarded status transition: applies only while the current status is
    /// inside `allowed`. Returns None when the guard failed.
    pub async fn transition(
        &self,
        order: &RecordId,
        new_status: OrderStatus,
        allowed: Vec<OrderStatus>,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET status = $status \
                 WHERE status INSIDE $allowed \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("status", new_status))
            .bind(("allowed", allowed))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Delivery confirmation: only the assigned agent, only from OutForDelivery
    pub async fn confirm_delivery(
        &self,
        order: &RecordId,
        agent: &RecordId,
        now: i64,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET status = $status, delivered_at = $now \
                 WHERE delivery_agent = $agent AND status = $from \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("agent", agent.clone()))
            .bind(("status", OrderStatus::Delivered))
            .bind(("from", OrderStatus::OutForDelivery))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Mark a cash-on-delivery payment as settled at delivery time
    pub async fn mark_cod_paid(&self, order: &RecordId, now: i64) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET payment_info.status = 'SUCCEEDED', paid_at = $now \
                 WHERE payment_info.type = 'CASH_ON_DELIVERY' \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Customer cancellation, guarded on ownership and cancellable status
    pub async fn cancel_by_customer(
        &self,
        order: &RecordId,
        customer_id: &str,
        reason: Option<String>,
        now: i64,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET status = $status, cancelled_at = $now, \
                 cancellation_reason = $reason, cancelled_by = $actor \
                 WHERE customer.id = $customer AND status INSIDE $allowed \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("customer", customer_id.to_string()))
            .bind(("status", OrderStatus::Cancelled))
            .bind(("actor", CancelActor::Customer))
            .bind(("reason", reason))
            .bind(("now", now))
            .bind((
                "allowed",
                vec![
                    OrderStatus::Processing,
                    OrderStatus::TransferredToDeliveryPartner,
                ],
            ))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Agent cancellation: unassigns the agent and terminates the order
    pub async fn cancel_by_agent(
        &self,
        order: &RecordId,
        agent: &RecordId,
        reason: Option<String>,
        now: i64,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET status = $status, delivery_agent = NONE, \
                 cancelled_at = $now, cancellation_reason = $reason, cancelled_by = $actor \
                 WHERE delivery_agent = $agent AND status INSIDE $allowed \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("agent", agent.clone()))
            .bind(("status", OrderStatus::CancelledByDeliveryman))
            .bind(("actor", CancelActor::Deliveryman))
            .bind(("reason", reason))
            .bind(("now", now))
            .bind((
                "allowed",
                vec![
                    OrderStatus::Processing,
                    OrderStatus::TransferredToDeliveryPartner,
                    OrderStatus::OutForDelivery,
                ],
            ))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Seller-driven cancellation: clears any assignment and stamps the
    /// cancellation fields in the same atomic update
    pub async fn cancel_by_seller(
        &self,
        order: &RecordId,
        new_status: OrderStatus,
        now: i64,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET status = $status, delivery_agent = NONE, \
                 cancelled_at = $now, cancelled_by = $actor \
                 WHERE status INSIDE $allowed \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("status", new_status))
            .bind(("actor", CancelActor::Seller))
            .bind(("now", now))
            .bind((
                "allowed",
                vec![
                    OrderStatus::Processing,
                    OrderStatus::TransferredToDeliveryPartner,
                    OrderStatus::OutForDelivery,
                    OrderStatus::RefundRequested,
                ],
            ))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Record an explicit decline. Fails the guard when the agent already
    /// ignored this order or is currently assigned to it.
    pub async fn add_ignore(&self, order: &RecordId, agent: &RecordId) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET ignored_by += $agent \
                 WHERE ignored_by CONTAINSNOT $agent AND delivery_agent != $agent \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .bind(("agent", agent.clone()))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Flip the stock-deduction guard. Returns None when already deducted,
    /// making the deduction idempotent per order.
    pub async fn mark_stock_deducted(&self, order: &RecordId) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET stock_deducted = true \
                 WHERE stock_deducted = false \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Flip the stock-restoration guard. Only succeeds once, and only after
    /// a deduction actually happened.
    pub async fn mark_stock_restored(&self, order: &RecordId) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET stock_restored = true \
                 WHERE stock_deducted = true AND stock_restored = false \
                 RETURN AFTER",
            )
            .bind(("order", order.clone()))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Fetch an order or surface NotFound - helper for guard disambiguation
    pub async fn require(&self, id: &RecordId) -> RepoResult<Order> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }
}
