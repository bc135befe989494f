//! Product Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product entity - stock and sold-count are adjusted only through
/// atomic repository updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub shop: RecordId,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub sold_count: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
