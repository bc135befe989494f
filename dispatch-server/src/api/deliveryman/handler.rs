//! Delivery Agent API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Order, OrderView, parse_ref};
use crate::dispatch::{arbiter, lifecycle};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

/// Accept / reject payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentActionRequest {
    pub agent_id: String,
}

/// Agent cancellation payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCancelRequest {
    pub agent_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Delivery confirmation payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeliveryRequest {
    pub agent_id: String,
    /// Optional confirmation code; when present it must match the order's
    #[serde(default)]
    pub otp: Option<String>,
}

/// Competitive order acceptance
pub async fn accept_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AgentActionRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let agent_id = parse_ref("delivery_agent", &payload.agent_id);
    let order = arbiter::accept_order(&state, &order_id, &agent_id).await?;
    Ok(ok_with_message(order, "Order assigned"))
}

/// Explicit decline
pub async fn ignore_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AgentActionRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let agent_id = parse_ref("delivery_agent", &payload.agent_id);
    let order = arbiter::ignore_order(&state, &order_id, &agent_id).await?;
    Ok(ok(order))
}

/// Agent cancellation of an assigned order
pub async fn cancel_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AgentCancelRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let agent_id = parse_ref("delivery_agent", &payload.agent_id);
    let order = lifecycle::cancel_by_agent(&state, &order_id, &agent_id, payload.reason).await?;
    Ok(ok(order))
}

/// Delivery confirmation
pub async fn confirm_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order_id = parse_ref("order", &id);
    let agent_id = parse_ref("delivery_agent", &payload.agent_id);
    let order =
        lifecycle::confirm_delivery(&state, &order_id, &agent_id, payload.otp.as_deref()).await?;
    Ok(ok_with_message(order, "Delivery confirmed"))
}

/// Every order ever assigned to this agent, newest first
pub async fn order_history(
    State(state): State<ServerState>,
    Path(agent): Path<String>,
) -> AppResult<Json<AppResponse<Vec<OrderView>>>> {
    let agent_id = parse_ref("delivery_agent", &agent);
    let history = lifecycle::agent_order_history(&state, &agent_id).await?;
    Ok(ok(history))
}
