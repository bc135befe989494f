//! Stock Compensator
//!
//! Returns reserved stock to products when an order dies after stock was
//! deducted. The `stock_restored` guard on the order makes the whole pass
//! at-most-once; within a pass each line is restored independently and a
//! failed line never aborts the others.

use super::error::DispatchResult;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::{OrderRepository, ProductRepository};

/// Outcome of one compensation pass
#[derive(Debug, Default)]
pub struct CompensationReport {
    /// Lines whose stock was returned
    pub restored: usize,
    /// Lines that could not be restored (product gone, storage error)
    pub failed: Vec<String>,
}

/// Restore stock for a cancelled or refunded order.
///
/// No-op when stock was never deducted or was already restored. Line
/// failures are logged and reported, never propagated.
pub async fn compensate_cancellation(
    state: &ServerState,
    order: &Order,
) -> DispatchResult<CompensationReport> {
    let Some(order_id) = &order.id else {
        return Ok(CompensationReport::default());
    };

    let orders = OrderRepository::new(state.get_db());
    if orders.mark_stock_restored(order_id).await?.is_none() {
        // Never deducted, or another compensation pass got here first
        return Ok(CompensationReport::default());
    }

    let products = ProductRepository::new(state.get_db());
    let mut report = CompensationReport::default();
    for line in &order.cart {
        match products.restore_stock(&line.product, line.quantity).await {
            Ok(Some(_)) => report.restored += 1,
            Ok(None) => {
                tracing::warn!(
                    "Stock restore skipped, product {} no longer exists",
                    line.product
                );
                report.failed.push(line.product.to_string());
            }
            Err(e) => {
                tracing::error!("Stock restore failed for product {}: {e}", line.product);
                report.failed.push(line.product.to_string());
            }
        }
    }

    tracing::info!(
        restored = report.restored,
        failed = report.failed.len(),
        "Compensated stock for order {order_id}"
    );
    Ok(report)
}
