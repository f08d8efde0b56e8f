use serde::{Deserialize, Serialize};

use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(length(min = 2, max = 2000))]
    pub description: String,

    #[validate(length(min = 2, max = 100))]
    pub category: String,

    #[validate(range(min = 0.0))]
    pub price: f64,

    #[validate(range(min = 0))]
    pub count_in_stock: i64,

    pub image: Option<String>,
}

/// Partial catalog update; absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 2, max = 2000))]
    pub description: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub category: Option<String>,

    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    #[validate(range(min = 0))]
    pub count_in_stock: Option<i64>,

    pub image: Option<String>,
}
