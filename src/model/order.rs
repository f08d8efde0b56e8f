use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// One purchased line. Name and unit price are copied from the product at
/// placement time so later catalog edits never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ObjectId,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Order record. Immutable once placed; the purchaser's name and email are
/// denormalized so admin listings need no join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub username: String,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    #[serde(default)]
    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub order_status: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Order {
    pub const STATUS_PENDING: &'static str = "pending";
}
