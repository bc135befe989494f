//! Notifier - external notification collaborator
//!
//! The platform never transports pushes itself; it hands them to a
//! gateway behind the [`Notifier`] trait. Implementations are pluggable:
//!
//! - [`HttpNotifier`] - POSTs to the configured push gateway
//! - [`MemoryNotifier`] - in-process recorder for tests
//!
//! Every recipient send is independent and unreliable; aggregation of
//! outcomes happens in the dispatch broadcaster, not here.

pub mod http;
pub mod memory;

pub use http::HttpNotifier;
pub use memory::MemoryNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notification delivery error - always recovered locally, never
/// propagated as a failure of the triggering operation
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Send failed: {0}")]
    Send(String),

    #[error("Send timed out after {0}ms")]
    Timeout(u64),
}

/// Structured payload for client-side deep-linking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPushData {
    pub order_id: String,
    pub order_code: Option<String>,
    pub shop_name: String,
    pub total_items: usize,
    pub total_price: f64,
}

/// One notification to one recipient channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: OrderPushData,
}

/// Outcome of one recipient's send within a fan-out
#[derive(Debug, Clone, Serialize)]
pub struct FanoutFailure {
    pub channel: String,
    pub error: String,
}

/// Aggregate fan-out outcome. Reported and logged, never an error.
#[derive(Debug, Default, Serialize)]
pub struct FanoutReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<FanoutFailure>,
}

/// External notification gateway
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to one channel. Failures are per-recipient
    /// and must not affect other sends.
    async fn send(&self, channel: &str, notification: &Notification) -> Result<(), NotifyError>;
}
