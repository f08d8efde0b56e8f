use axum::{Router, routing::{get, post, put, delete}};
use crate::handler::product_handler::{
    list_products_handler,
    get_product_handler,
    create_product_handler,
    update_product_handler,
    delete_product_handler,
};
use std::sync::Arc;
use crate::service::product_service::ProductServiceImpl;

pub fn product_router(service: Arc<ProductServiceImpl>) -> Router {
    // Reads are public; writes are admin-only per the gate's policy table
    Router::new()
        .route("/products", get(list_products_handler))
        .route("/products", post(create_product_handler))
        .route("/products/{id}", get(get_product_handler))
        .route("/products/{id}", put(update_product_handler))
        .route("/products/{id}", delete(delete_product_handler))
        .with_state(service)
}
