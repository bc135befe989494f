//! Delivery Agent API Module
//!
//! Accepting, rejecting, cancelling and confirming deliveries.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Delivery agent router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/deliveryman", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Competitive acceptance - first one wins
        .route("/accept-order/{id}", put(handler::accept_order))
        // Explicit decline - never offered again
        .route("/ignore-order/{id}", put(handler::ignore_order))
        // Agent cancellation
        .route("/cancel-order/{id}", put(handler::cancel_order))
        // Delivery confirmation with optional code check
        .route("/confirm-delivery/{id}", put(handler::confirm_delivery))
        // Assignment history
        .route("/{agent}/order-history", get(handler::order_history))
}
