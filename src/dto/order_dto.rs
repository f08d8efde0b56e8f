use serde::{Deserialize, Serialize};

use validator::Validate;

/// One cart line on the wire: a product reference and a desired quantity.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    #[validate(length(equal = 24))] // MongoDB ObjectId hex string
    pub product: String,

    #[validate(range(min = 1))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressInput {
    #[validate(length(min = 2, max = 200))]
    pub address: String,

    #[validate(length(min = 1, max = 100))]
    pub city: String,

    #[validate(length(min = 2, max = 20))]
    pub postal_code: String,

    #[validate(length(min = 2, max = 100))]
    pub country: String,
}

/// Checkout payload. The client-side totals are advisory; the placement
/// engine recomputes every amount from the catalog before accepting.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub order_items: Vec<OrderItemInput>,

    pub shipping_address: ShippingAddressInput,

    #[validate(length(min = 2, max = 50))]
    pub payment_method: String,

    // The per-bucket amounts are optional on the wire; only the grand
    // total is cross-checked
    #[serde(default)]
    pub items_price: f64,

    #[serde(default)]
    pub tax_price: f64,

    #[serde(default)]
    pub shipping_price: f64,

    pub total_price: f64,
}

/// Collapse repeated references to the same product into one line, summing
/// quantities. First-seen order is preserved.
pub fn merge_duplicate_lines(items: &[OrderItemInput]) -> Vec<OrderItemInput> {
    let mut merged: Vec<OrderItemInput> = Vec::new();
    for item in items {
        match merged.iter_mut().find(|m| m.product == item.product) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(item.clone()),
        }
    }
    merged
}
