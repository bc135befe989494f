//! Delivery Agent Model

use super::order::GeoPoint;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Independent delivery agent competing for order assignments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAgent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub phone: String,
    /// Agent toggles this while on/off shift
    #[serde(default)]
    pub is_available: bool,
    /// Set by the platform after vetting
    #[serde(default)]
    pub is_approved: bool,
    /// Registered notification channel; agents without one are not broadcast to
    #[serde(default)]
    pub push_channel: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}
