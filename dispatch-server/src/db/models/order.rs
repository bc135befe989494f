//! Order Model
//!
//! One order per shop, created as a group from a single checkout.
//! Mutations happen through conditional updates in the repository layer,
//! never through read-modify-write.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Processing,
    TransferredToDeliveryPartner,
    OutForDelivery,
    Delivered,
    Cancelled,
    CancelledByUser,
    CancelledByDeliveryman,
    RefundRequested,
    RefundSucceeded,
}

impl OrderStatus {
    /// Terminal states are never re-opened
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered
                | OrderStatus::Cancelled
                | OrderStatus::CancelledByUser
                | OrderStatus::CancelledByDeliveryman
                | OrderStatus::RefundSucceeded
        )
    }

    /// Statuses from which a delivery agent may accept the order
    pub fn is_acceptable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Processing | OrderStatus::TransferredToDeliveryPartner
        )
    }

    /// Statuses from which the customer may still cancel
    pub fn is_cancellable_by_customer(&self) -> bool {
        matches!(
            self,
            OrderStatus::Processing | OrderStatus::TransferredToDeliveryPartner
        )
    }

    /// Statuses from which the assigned agent may still cancel
    pub fn is_cancellable_by_agent(&self) -> bool {
        matches!(
            self,
            OrderStatus::Processing
                | OrderStatus::TransferredToDeliveryPartner
                | OrderStatus::OutForDelivery
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::TransferredToDeliveryPartner => "TRANSFERRED_TO_DELIVERY_PARTNER",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::CancelledByUser => "CANCELLED_BY_USER",
            OrderStatus::CancelledByDeliveryman => "CANCELLED_BY_DELIVERYMAN",
            OrderStatus::RefundRequested => "REFUND_REQUESTED",
            OrderStatus::RefundSucceeded => "REFUND_SUCCEEDED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who cancelled the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelActor {
    Customer,
    Deliveryman,
    Seller,
}

// =============================================================================
// Embedded value objects
// =============================================================================

/// One cart line, immutable after order creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product: RecordId,
    pub shop: RecordId,
    pub quantity: u32,
    pub unit_price: f64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Customer snapshot captured at order-creation time.
/// Stays valid even if the account later changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSnapshot {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Notification channel registered at checkout time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_channel: Option<String>,
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    #[default]
    CashOnDelivery,
    Card,
}

/// Payment info carried on the order
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: PaymentStatus,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
}

/// Geolocation with optional human-readable address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// =============================================================================
// Order (main table)
// =============================================================================

/// Order entity - one per shop per checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Externally visible sequential code; None when the counter was
    /// unavailable at creation (assigned later)
    pub code: Option<String>,
    pub cart: Vec<OrderLine>,
    pub shop: RecordId,
    pub customer: CustomerSnapshot,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_agent: Option<RecordId>,
    /// Agents that explicitly declined this order; never re-offered
    #[serde(default)]
    pub ignored_by: Vec<RecordId>,
    /// 6-digit delivery confirmation code; verification is optional
    pub otp: String,
    #[serde(default)]
    pub user_location: Option<GeoPoint>,
    pub shipping_address: String,
    pub total_price: f64,
    pub payment_info: PaymentInfo,
    /// Guard: stock decremented at most once per order
    #[serde(default)]
    pub stock_deducted: bool,
    /// Guard: stock restored at most once after deduction
    #[serde(default)]
    pub stock_restored: bool,
    pub created_at: i64,
    #[serde(default)]
    pub paid_at: Option<i64>,
    #[serde(default)]
    pub delivered_at: Option<i64>,
    #[serde(default)]
    pub cancelled_at: Option<i64>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub cancelled_by: Option<CancelActor>,
}

// =============================================================================
// API Request Types
// =============================================================================

/// One cart line as submitted at checkout (string refs, parsed on create)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub product: String,
    pub shop: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Customer identity as submitted at checkout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub push_channel: Option<String>,
}

/// Checkout payload - a flat cart possibly spanning several shops
#[derive(Debug, Clone, Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "cart cannot be empty"))]
    pub cart: Vec<CartLineInput>,
    #[validate(length(min = 1, message = "shipping address is required"))]
    pub shipping_address: String,
    pub total_price: f64,
    #[serde(default)]
    pub payment_info: PaymentInfo,
    pub customer: CustomerInput,
    #[serde(default)]
    pub user_location: Option<GeoPoint>,
}

// =============================================================================
// API Response Types
// =============================================================================

/// Order detail for read endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: String,
    pub code: Option<String>,
    pub status: OrderStatus,
    pub shop: String,
    pub cart: Vec<OrderLine>,
    pub total_price: f64,
    pub otp: String,
    pub delivery_agent: Option<String>,
    pub shipping_address: String,
    pub payment_info: PaymentInfo,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancellation_reason: Option<String>,
    /// Best-effort agent-to-customer distance annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<crate::dispatch::geo::DistanceInfo>,
    /// Shop balance, exposed only in multi-vendor mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_balance: Option<f64>,
}

/// Resolve a string reference to a record id.
///
/// Accepts either a full "table:key" reference or a bare key.
pub fn parse_ref(table: &str, value: &str) -> RecordId {
    if value.contains(':') {
        value
            .parse()
            .unwrap_or_else(|_| RecordId::from_table_key(table, value))
    } else {
        RecordId::from_table_key(table, value)
    }
}
