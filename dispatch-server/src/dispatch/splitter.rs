//! Cart Splitter
//!
//! One checkout, N shops, N orders. The split itself is pure; order
//! creation goes through a single transactional insert so a checkout can
//! never half-materialize.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use surrealdb::RecordId;

use super::broadcaster;
use super::error::{DispatchError, DispatchResult};
use super::geo;
use crate::core::ServerState;
use crate::db::models::{
    CheckoutRequest, CustomerSnapshot, Order, OrderLine, OrderStatus, parse_ref,
};
use crate::db::repository::{OrderRepository, SequenceRepository};

/// Group cart lines by shop, preserving the order in which shops first
/// appear in the cart.
pub fn split_cart(cart: &[OrderLine]) -> Vec<(RecordId, Vec<OrderLine>)> {
    let mut groups: Vec<(RecordId, Vec<OrderLine>)> = Vec::new();
    for line in cart {
        match groups.iter_mut().find(|(shop, _)| *shop == line.shop) {
            Some((_, lines)) => lines.push(line.clone()),
            None => groups.push((line.shop.clone(), vec![line.clone()])),
        }
    }
    groups
}

/// Sum of quantity * unit_price over a group, computed in decimal to keep
/// per-shop totals exact
pub fn group_total(lines: &[OrderLine]) -> f64 {
    let total: Decimal = lines
        .iter()
        .map(|line| {
            Decimal::from_f64(line.unit_price).unwrap_or_default() * Decimal::from(line.quantity)
        })
        .sum();
    total.to_f64().unwrap_or(0.0)
}

/// Random 6-digit delivery confirmation code
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// Create one order per shop from a checkout request.
///
/// Validates the payload, splits the cart, assigns codes and confirmation
/// codes, persists the whole group atomically, then kicks off a
/// fire-and-forget notification broadcast per created order.
pub async fn create_orders(
    state: &ServerState,
    request: CheckoutRequest,
) -> DispatchResult<Vec<Order>> {
    validate_checkout(&request)?;

    let cart: Vec<OrderLine> = request
        .cart
        .iter()
        .map(|line| OrderLine {
            product: parse_ref("product", &line.product),
            shop: parse_ref("shop", &line.shop),
            quantity: line.quantity,
            unit_price: line.unit_price,
            name: line.name.clone(),
            image: line.image.clone(),
        })
        .collect();

    let customer = CustomerSnapshot {
        id: request.customer.id.clone(),
        name: request.customer.name.clone(),
        email: request.customer.email.clone(),
        phone: request.customer.phone.clone(),
        push_channel: request.customer.push_channel.clone(),
    };

    let sequences = SequenceRepository::new(state.get_db());
    let now = chrono::Utc::now().timestamp_millis();

    let mut orders = Vec::new();
    for (shop, lines) in split_cart(&cart) {
        // A missing code never blocks checkout
        let code = match sequences.next_order_code().await {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::warn!("Order code generation failed, creating without code: {e}");
                None
            }
        };

        let total_price = group_total(&lines);
        orders.push(Order {
            id: None,
            code,
            cart: lines,
            shop,
            customer: customer.clone(),
            status: OrderStatus::Processing,
            delivery_agent: None,
            ignored_by: Vec::new(),
            otp: generate_otp(),
            user_location: request.user_location.clone(),
            shipping_address: request.shipping_address.clone(),
            total_price,
            payment_info: request.payment_info.clone(),
            stock_deducted: false,
            stock_restored: false,
            created_at: now,
            paid_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            cancelled_by: None,
        });
    }

    let created = OrderRepository::new(state.get_db())
        .create_group(orders)
        .await?;

    for order in &created {
        broadcaster::spawn_broadcast(state.clone(), order.clone());
    }

    Ok(created)
}

fn validate_checkout(request: &CheckoutRequest) -> DispatchResult<()> {
    if request.cart.is_empty() {
        return Err(DispatchError::Validation("cart cannot be empty".into()));
    }
    if request.shipping_address.trim().is_empty() {
        return Err(DispatchError::Validation(
            "shipping address is required".into(),
        ));
    }
    for (i, line) in request.cart.iter().enumerate() {
        if line.quantity == 0 {
            return Err(DispatchError::Validation(format!(
                "cart line {i}: quantity must be at least 1"
            )));
        }
        if !line.unit_price.is_finite() || line.unit_price < 0.0 {
            return Err(DispatchError::Validation(format!(
                "cart line {i}: invalid unit price"
            )));
        }
    }
    if let Some(point) = &request.user_location
        && !geo::is_valid_point(point)
    {
        return Err(DispatchError::Validation(
            "user location is out of range".into(),
        ));
    }
    Ok(())
}
