//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{CheckoutRequest, Order, OrderStatus, OrderView, parse_ref};
use crate::dispatch::{lifecycle, splitter};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

/// Seller status update payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Customer cancellation payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub customer_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Refund request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub customer_id: String,
}

/// Create one order per shop from a single checkout
pub async fn create_order(
    State(state): State<ServerState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    payload.validate()?;
    let orders = splitter::create_orders(&state, payload).await?;
    Ok(ok_with_message(
        orders,
        "Orders created",
    ))
}

/// Seller-driven status update
pub async fn update_order_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let order = lifecycle::update_status_by_seller(&state, &order_id, payload.status).await?;
    Ok(ok(order))
}

/// Customer cancellation
pub async fn cancel_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let order =
        lifecycle::cancel_by_customer(&state, &order_id, &payload.customer_id, payload.reason)
            .await?;
    Ok(ok(order))
}

/// Customer refund request
pub async fn request_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let order = lifecycle::request_refund(&state, &order_id, &payload.customer_id).await?;
    Ok(ok(order))
}

/// Seller refund approval
pub async fn approve_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let order = lifecycle::approve_refund(&state, &order_id).await?;
    Ok(ok(order))
}

/// Order detail with distance annotation
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OrderView>>> {
    let order_id = parse_ref("order", &id);
    let view = lifecycle::order_view(&state, &order_id).await?;
    Ok(ok(view))
}
