//! Shop Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Shop (seller) entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    /// Seller notification channel for new-order alerts
    #[serde(default)]
    pub push_channel: Option<String>,
    /// Credited on delivery, minus platform commission
    #[serde(default)]
    pub available_balance: f64,
}
