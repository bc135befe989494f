//! Order Lifecycle
//!
//! Seller status updates, delivery confirmation, cancellations and
//! refunds. Every transition is a guarded repository update; when the
//! guard fails, one follow-up read decides whether the caller raced a
//! terminal state, the wrong actor, or a stale status.

use surrealdb::RecordId;

use super::broadcaster;
use super::compensator;
use super::error::{DispatchError, DispatchResult};
use super::geo;
use crate::core::{AppType, ServerState};
use crate::db::models::{Order, OrderStatus, OrderView};
use crate::db::repository::{
    DeliveryAgentRepository, OrderRepository, ProductRepository, ShopRepository,
};

fn non_terminal() -> Vec<OrderStatus> {
    vec![
        OrderStatus::Processing,
        OrderStatus::TransferredToDeliveryPartner,
        OrderStatus::OutForDelivery,
        OrderStatus::RefundRequested,
    ]
}

// =============================================================================
// Seller status updates
// =============================================================================

/// Seller-driven status update.
///
/// Delivery statuses are reserved for the agent flow. Moving into
/// TransferredToDeliveryPartner deducts stock (once); moving into a
/// cancelled status unassigns any agent and stamps the cancellation
/// fields; cancelled and refunded statuses restore stock.
pub async fn update_status_by_seller(
    state: &ServerState,
    order_id: &RecordId,
    new_status: OrderStatus,
) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());
    let before = orders.require(order_id).await?;

    let updated = match new_status {
        OrderStatus::OutForDelivery | OrderStatus::Delivered => {
            return Err(DispatchError::Validation(format!(
                "status {new_status} is set through the delivery flow"
            )));
        }
        OrderStatus::Cancelled
        | OrderStatus::CancelledByUser
        | OrderStatus::CancelledByDeliveryman => {
            let now = chrono::Utc::now().timestamp_millis();
            orders.cancel_by_seller(order_id, new_status, now).await?
        }
        OrderStatus::TransferredToDeliveryPartner => {
            orders
                .transition(order_id, new_status, vec![OrderStatus::Processing])
                .await?
        }
        OrderStatus::RefundSucceeded => {
            orders
                .transition(order_id, new_status, vec![OrderStatus::RefundRequested])
                .await?
        }
        _ => orders.transition(order_id, new_status, non_terminal()).await?,
    };

    let Some(updated) = updated else {
        let current = orders.require(order_id).await?;
        return Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "update status",
        });
    };

    match new_status {
        OrderStatus::TransferredToDeliveryPartner => {
            deduct_stock(state, &updated).await?;
        }
        OrderStatus::RefundSucceeded
        | OrderStatus::Cancelled
        | OrderStatus::CancelledByUser
        | OrderStatus::CancelledByDeliveryman => {
            compensator::compensate_cancellation(state, &updated).await?;
        }
        _ => {}
    }

    tracing::info!("Order {order_id} moved {} to {}", before.status, new_status);
    broadcaster::notify_customer(
        state,
        &updated,
        "Order status updated",
        &format!(
            "Your order {} changed from {} to {}",
            updated.code.as_deref().unwrap_or(""),
            before.status,
            new_status
        ),
    );
    Ok(updated)
}

/// Deduct stock for every line of the order, at most once per order.
///
/// The per-order guard flips first; individual line failures are logged
/// and skipped so one dead product cannot wedge the handoff.
pub async fn deduct_stock(state: &ServerState, order: &Order) -> DispatchResult<()> {
    let Some(order_id) = &order.id else {
        return Ok(());
    };
    let orders = OrderRepository::new(state.get_db());
    if orders.mark_stock_deducted(order_id).await?.is_none() {
        return Ok(());
    }

    let products = ProductRepository::new(state.get_db());
    for line in &order.cart {
        match products.deduct_stock(&line.product, line.quantity).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(
                    "Stock deduction skipped, product {} no longer exists",
                    line.product
                );
            }
            Err(e) => {
                tracing::error!("Stock deduction failed for product {}: {e}", line.product);
            }
        }
    }
    Ok(())
}

// =============================================================================
// Delivery confirmation
// =============================================================================

/// Confirm delivery by the assigned agent.
///
/// When a confirmation code is supplied it must match the order's code;
/// omitting it skips verification. Settles cash-on-delivery payments and
/// credits the seller balance minus the platform commission.
pub async fn confirm_delivery(
    state: &ServerState,
    order_id: &RecordId,
    agent_id: &RecordId,
    otp: Option<&str>,
) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());
    let current = orders.require(order_id).await?;

    if let Some(code) = otp
        && code != current.otp
    {
        return Err(DispatchError::Validation(
            "incorrect delivery confirmation code".into(),
        ));
    }

    let now = chrono::Utc::now().timestamp_millis();
    let Some(mut delivered) = orders.confirm_delivery(order_id, agent_id, now).await? else {
        if current.delivery_agent.as_ref() != Some(agent_id) {
            return Err(DispatchError::Forbidden(
                "only the assigned delivery agent can confirm delivery".into(),
            ));
        }
        return Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "confirm delivery",
        });
    };

    if let Some(settled) = orders.mark_cod_paid(order_id, now).await? {
        delivered = settled;
    }

    let seller_share = delivered.total_price * (1.0 - state.config.commission_rate);
    let shops = ShopRepository::new(state.get_db());
    match shops.credit_balance(&delivered.shop, seller_share).await? {
        Some(_) => {
            tracing::info!(
                "Credited {:.2} to shop {} for order {order_id}",
                seller_share,
                delivered.shop
            );
        }
        None => {
            tracing::warn!(
                "Shop {} not found, balance not credited for order {order_id}",
                delivered.shop
            );
        }
    }

    broadcaster::notify_customer(
        state,
        &delivered,
        "Order delivered",
        &format!(
            "Your order {} has been delivered",
            delivered.code.as_deref().unwrap_or("")
        ),
    );
    Ok(delivered)
}

// =============================================================================
// Cancellations
// =============================================================================

/// Customer cancellation: ownership-checked, only before the order is out
/// for delivery, with stock compensation.
pub async fn cancel_by_customer(
    state: &ServerState,
    order_id: &RecordId,
    customer_id: &str,
    reason: Option<String>,
) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());
    let now = chrono::Utc::now().timestamp_millis();

    let Some(cancelled) = orders
        .cancel_by_customer(order_id, customer_id, reason, now)
        .await?
    else {
        let current = orders.require(order_id).await?;
        if current.customer.id != customer_id {
            return Err(DispatchError::Forbidden(
                "order belongs to another customer".into(),
            ));
        }
        return Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "cancel",
        });
    };

    compensator::compensate_cancellation(state, &cancelled).await?;
    broadcaster::notify_customer(
        state,
        &cancelled,
        "Order cancelled",
        &format!(
            "Your order {} was cancelled",
            cancelled.code.as_deref().unwrap_or("")
        ),
    );
    Ok(cancelled)
}

/// Agent cancellation: only the assigned agent, any time before delivery.
/// The order terminates and the agent is unassigned.
pub async fn cancel_by_agent(
    state: &ServerState,
    order_id: &RecordId,
    agent_id: &RecordId,
    reason: Option<String>,
) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());
    let now = chrono::Utc::now().timestamp_millis();

    let Some(cancelled) = orders.cancel_by_agent(order_id, agent_id, reason, now).await? else {
        let current = orders.require(order_id).await?;
        if current.delivery_agent.as_ref() != Some(agent_id) {
            return Err(DispatchError::Forbidden(
                "only the assigned delivery agent can cancel this order".into(),
            ));
        }
        return Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "cancel",
        });
    };

    compensator::compensate_cancellation(state, &cancelled).await?;
    broadcaster::notify_customer(
        state,
        &cancelled,
        "Order cancelled",
        &format!(
            "Your order {} was cancelled by the delivery agent",
            cancelled.code.as_deref().unwrap_or("")
        ),
    );
    Ok(cancelled)
}

// =============================================================================
// Refunds
// =============================================================================

/// Customer refund request, only while the order is still processing
pub async fn request_refund(
    state: &ServerState,
    order_id: &RecordId,
    customer_id: &str,
) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());
    let current = orders.require(order_id).await?;
    if current.customer.id != customer_id {
        return Err(DispatchError::Forbidden(
            "order belongs to another customer".into(),
        ));
    }

    let allowed = vec![OrderStatus::Processing];
    let Some(updated) = orders
        .transition(order_id, OrderStatus::RefundRequested, allowed)
        .await?
    else {
        let current = orders.require(order_id).await?;
        return Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "request refund",
        });
    };

    broadcaster::notify_customer(
        state,
        &updated,
        "Refund requested",
        &format!(
            "Refund requested for order {}",
            updated.code.as_deref().unwrap_or("")
        ),
    );
    Ok(updated)
}

/// Seller refund approval: terminates the order and restores stock
pub async fn approve_refund(state: &ServerState, order_id: &RecordId) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());

    let Some(refunded) = orders
        .transition(
            order_id,
            OrderStatus::RefundSucceeded,
            vec![OrderStatus::RefundRequested],
        )
        .await?
    else {
        let current = orders.require(order_id).await?;
        return Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "approve refund",
        });
    };

    compensator::compensate_cancellation(state, &refunded).await?;
    broadcaster::notify_customer(
        state,
        &refunded,
        "Refund approved",
        &format!(
            "Refund approved for order {}",
            refunded.code.as_deref().unwrap_or("")
        ),
    );
    Ok(refunded)
}

// =============================================================================
// Read models
// =============================================================================

/// Order detail with best-effort distance annotation and, in multi-vendor
/// mode, the shop balance.
pub async fn order_view(state: &ServerState, order_id: &RecordId) -> DispatchResult<OrderView> {
    let order = OrderRepository::new(state.get_db())
        .require(order_id)
        .await?;

    let mut agent_location = None;
    if let Some(agent_id) = &order.delivery_agent
        && let Ok(Some(agent)) = DeliveryAgentRepository::new(state.get_db())
            .find_by_id(agent_id)
            .await
    {
        agent_location = agent.location;
    }
    let distance = geo::annotate(agent_location.as_ref(), order.user_location.as_ref());

    let shop_balance = match state.config.app_type {
        AppType::MultiVendor => ShopRepository::new(state.get_db())
            .find_by_id(&order.shop)
            .await
            .ok()
            .flatten()
            .map(|shop| shop.available_balance),
        AppType::SingleVendor => None,
    };

    Ok(to_view(order, distance, shop_balance))
}

/// Every order ever assigned to an agent, newest first, annotated with
/// the agent's current distance to each drop-off point.
pub async fn agent_order_history(
    state: &ServerState,
    agent_id: &RecordId,
) -> DispatchResult<Vec<OrderView>> {
    let agent = DeliveryAgentRepository::new(state.get_db())
        .find_by_id(agent_id)
        .await?
        .ok_or_else(|| DispatchError::NotFound(format!("Delivery agent {agent_id} not found")))?;

    let orders = OrderRepository::new(state.get_db())
        .find_by_agent(agent_id)
        .await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let distance = geo::annotate(agent.location.as_ref(), order.user_location.as_ref());
            to_view(order, distance, None)
        })
        .collect())
}

fn to_view(
    order: Order,
    distance: Option<geo::DistanceInfo>,
    shop_balance: Option<f64>,
) -> OrderView {
    OrderView {
        order_id: order
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        code: order.code,
        status: order.status,
        shop: order.shop.to_string(),
        cart: order.cart,
        total_price: order.total_price,
        otp: order.otp,
        delivery_agent: order.delivery_agent.map(|id| id.to_string()),
        shipping_address: order.shipping_address,
        payment_info: order.payment_info,
        created_at: order.created_at,
        delivered_at: order.delivered_at,
        cancelled_at: order.cancelled_at,
        cancellation_reason: order.cancellation_reason,
        distance,
        shop_balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::models::{
        CancelActor, CartLineInput, CheckoutRequest, CustomerInput, DeliveryAgent, PaymentInfo,
        PaymentKind, PaymentStatus, Product, Shop,
    };
    use crate::dispatch::{arbiter, splitter};
    use crate::notify::MemoryNotifier;
    use std::sync::Arc;

    struct Fixture {
        state: ServerState,
        shop: RecordId,
        product: RecordId,
        order: Order,
    }

    async fn fixture() -> Fixture {
        let mut config = Config::default();
        config.commission_rate = 0.10;
        let state = ServerState::initialize_in_memory(config, Arc::new(MemoryNotifier::new()))
            .await
            .unwrap();

        let shop = ShopRepository::new(state.get_db())
            .create(Shop {
                id: None,
                name: "Pizza Place".into(),
                push_channel: None,
                available_balance: 0.0,
            })
            .await
            .unwrap()
            .id
            .unwrap();

        let product = ProductRepository::new(state.get_db())
            .create(Product {
                id: None,
                name: "Margherita".into(),
                shop: shop.clone(),
                price: 10.0,
                stock: 10,
                sold_count: 0,
                image: None,
                is_active: true,
            })
            .await
            .unwrap()
            .id
            .unwrap();

        let request = CheckoutRequest {
            cart: vec![CartLineInput {
                product: product.to_string(),
                shop: shop.to_string(),
                quantity: 2,
                unit_price: 10.0,
                name: "Margherita".into(),
                image: None,
            }],
            shipping_address: "Street 1".into(),
            total_price: 20.0,
            payment_info: PaymentInfo {
                id: None,
                status: PaymentStatus::Pending,
                kind: PaymentKind::CashOnDelivery,
            },
            customer: CustomerInput {
                id: "u1".into(),
                name: "Alice".into(),
                email: "a@example.com".into(),
                phone: "111".into(),
                push_channel: None,
            },
            user_location: None,
        };
        let order = splitter::create_orders(&state, request)
            .await
            .unwrap()
            .remove(0);

        Fixture {
            state,
            shop,
            product,
            order,
        }
    }

    async fn seed_agent(state: &ServerState) -> RecordId {
        DeliveryAgentRepository::new(state.get_db())
            .create(DeliveryAgent {
                id: None,
                name: "Courier".into(),
                phone: "000".into(),
                is_available: true,
                is_approved: true,
                push_channel: Some("ch-courier".into()),
                location: None,
            })
            .await
            .unwrap()
            .id
            .unwrap()
    }

    async fn product_stock(state: &ServerState, product: &RecordId) -> i64 {
        ProductRepository::new(state.get_db())
            .find_by_id(product)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn transfer_deducts_stock_exactly_once() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        let updated = update_status_by_seller(
            &f.state,
            &order_id,
            OrderStatus::TransferredToDeliveryPartner,
        )
        .await
        .unwrap();
        assert_eq!(updated.status, OrderStatus::TransferredToDeliveryPartner);
        assert_eq!(product_stock(&f.state, &f.product).await, 8);

        // Re-transferring fails the status guard and cannot double-deduct
        let err = update_status_by_seller(
            &f.state,
            &order_id,
            OrderStatus::TransferredToDeliveryPartner,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTransition { .. }));
        assert_eq!(product_stock(&f.state, &f.product).await, 8);
    }

    #[tokio::test]
    async fn seller_cannot_set_delivery_statuses() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        for status in [OrderStatus::OutForDelivery, OrderStatus::Delivered] {
            let err = update_status_by_seller(&f.state, &order_id, status)
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn seller_cancel_of_an_assigned_order_unassigns_and_stamps() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        update_status_by_seller(
            &f.state,
            &order_id,
            OrderStatus::TransferredToDeliveryPartner,
        )
        .await
        .unwrap();
        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();
        assert_eq!(product_stock(&f.state, &f.product).await, 8);

        let cancelled = update_status_by_seller(&f.state, &order_id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.delivery_agent.is_none());
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.cancelled_by, Some(CancelActor::Seller));
        assert_eq!(product_stock(&f.state, &f.product).await, 10);
    }

    #[tokio::test]
    async fn terminal_orders_are_immutable() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        cancel_by_customer(&f.state, &order_id, "u1", None)
            .await
            .unwrap();

        let err = update_status_by_seller(
            &f.state,
            &order_id,
            OrderStatus::TransferredToDeliveryPartner,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidTransition {
                current: OrderStatus::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn delivery_confirmation_settles_cod_and_credits_seller() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();

        let err = confirm_delivery(&f.state, &order_id, &agent, Some("000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));

        let delivered = confirm_delivery(&f.state, &order_id, &agent, Some(&f.order.otp))
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.payment_info.status, PaymentStatus::Succeeded);
        assert!(delivered.paid_at.is_some());
        assert!(delivered.delivered_at.is_some());

        let shop = ShopRepository::new(f.state.get_db())
            .find_by_id(&f.shop)
            .await
            .unwrap()
            .unwrap();
        assert!((shop.available_balance - 18.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn only_the_assigned_agent_can_confirm() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let assigned = seed_agent(&f.state).await;
        let intruder = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &assigned)
            .await
            .unwrap();

        let err = confirm_delivery(&f.state, &order_id, &intruder, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Forbidden(_)));
    }

    #[tokio::test]
    async fn confirmation_without_code_skips_verification() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();
        let delivered = confirm_delivery(&f.state, &order_id, &agent, None)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn customer_cancel_after_transfer_restores_stock() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        update_status_by_seller(
            &f.state,
            &order_id,
            OrderStatus::TransferredToDeliveryPartner,
        )
        .await
        .unwrap();
        assert_eq!(product_stock(&f.state, &f.product).await, 8);

        let cancelled = cancel_by_customer(&f.state, &order_id, "u1", Some("changed my mind".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("changed my mind")
        );
        assert_eq!(product_stock(&f.state, &f.product).await, 10);
    }

    #[tokio::test]
    async fn cancel_before_transfer_restores_nothing() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        cancel_by_customer(&f.state, &order_id, "u1", None)
            .await
            .unwrap();
        assert_eq!(product_stock(&f.state, &f.product).await, 10);
    }

    #[tokio::test]
    async fn customer_cannot_cancel_someone_elses_order() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        let err = cancel_by_customer(&f.state, &order_id, "intruder", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Forbidden(_)));
    }

    #[tokio::test]
    async fn customer_cannot_cancel_once_out_for_delivery() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();

        let err = cancel_by_customer(&f.state, &order_id, "u1", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidTransition {
                current: OrderStatus::OutForDelivery,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn agent_cancel_unassigns_and_terminates() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();
        let cancelled = cancel_by_agent(&f.state, &order_id, &agent, Some("vehicle broke".into()))
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::CancelledByDeliveryman);
        assert!(cancelled.delivery_agent.is_none());
    }

    #[tokio::test]
    async fn unassigned_agent_cannot_cancel() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        let err = cancel_by_agent(&f.state, &order_id, &agent, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Forbidden(_)));
    }

    #[tokio::test]
    async fn refund_flow_from_processing() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        let requested = request_refund(&f.state, &order_id, "u1").await.unwrap();
        assert_eq!(requested.status, OrderStatus::RefundRequested);

        let refunded = approve_refund(&f.state, &order_id).await.unwrap();
        assert_eq!(refunded.status, OrderStatus::RefundSucceeded);
        // Stock was never deducted, so nothing to restore
        assert_eq!(product_stock(&f.state, &f.product).await, 10);

        // Terminal now
        let err = request_refund(&f.state, &order_id, "u1").await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn refund_approval_restores_stock_deducted_at_transfer() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        update_status_by_seller(
            &f.state,
            &order_id,
            OrderStatus::TransferredToDeliveryPartner,
        )
        .await
        .unwrap();
        assert_eq!(product_stock(&f.state, &f.product).await, 8);

        // Seller walks the order into the refund path
        update_status_by_seller(&f.state, &order_id, OrderStatus::RefundRequested)
            .await
            .unwrap();
        let refunded = approve_refund(&f.state, &order_id).await.unwrap();
        assert_eq!(refunded.status, OrderStatus::RefundSucceeded);
        assert_eq!(product_stock(&f.state, &f.product).await, 10);
    }

    #[tokio::test]
    async fn refund_cannot_be_requested_after_delivery() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();
        confirm_delivery(&f.state, &order_id, &agent, None)
            .await
            .unwrap();

        let err = request_refund(&f.state, &order_id, "u1").await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidTransition {
                current: OrderStatus::Delivered,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn refund_approval_requires_a_request() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        let err = approve_refund(&f.state, &order_id).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidTransition {
                current: OrderStatus::Processing,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn order_view_reports_status_and_balance() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();

        let view = order_view(&f.state, &order_id).await.unwrap();
        assert_eq!(view.status, OrderStatus::Processing);
        assert_eq!(view.total_price, 20.0);
        assert!(view.distance.is_none());
    }

    #[tokio::test]
    async fn agent_history_lists_assignments_newest_first() {
        let f = fixture().await;
        let order_id = f.order.id.clone().unwrap();
        let agent = seed_agent(&f.state).await;

        arbiter::accept_order(&f.state, &order_id, &agent)
            .await
            .unwrap();

        let history = agent_order_history(&f.state, &agent).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, OrderStatus::OutForDelivery);

        let ghost = RecordId::from_table_key("delivery_agent", "ghost");
        let err = agent_order_history(&f.state, &ghost).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }
}
