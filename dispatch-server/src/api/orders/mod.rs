//! Order API Module
//!
//! Checkout, seller status updates, customer cancellation and refunds.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Checkout: one request, one order per shop
        .route("/create-order", post(handler::create_order))
        // Seller-driven status update
        .route("/update-order-status/{id}", put(handler::update_order_status))
        // Customer cancellation
        .route("/cancel-order/{id}", put(handler::cancel_order))
        // Refund request / approval
        .route("/request-refund/{id}", put(handler::request_refund))
        .route("/approve-refund/{id}", put(handler::approve_refund))
        // Order detail
        .route("/{id}", get(handler::get_by_id))
}
