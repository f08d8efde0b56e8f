use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Catalog entry. `name` carries a unique index; `count_in_stock` is the
/// only mutable quantity during checkout and is adjusted exclusively through
/// guarded `$inc` updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub count_in_stock: i64,
    pub image: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
