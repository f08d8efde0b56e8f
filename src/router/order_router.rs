use axum::{Router, routing::{get, post}};
use crate::handler::order_handler::{
    place_order_handler,
    my_orders_handler,
    get_order_handler,
    list_orders_handler,
};
use std::sync::Arc;
use crate::service::order_service::OrderServiceImpl;

pub fn order_router(service: Arc<OrderServiceImpl>) -> Router {
    // myorders is registered as a literal, so it never shadows into {id}
    Router::new()
        .route("/orders", post(place_order_handler))
        .route("/orders", get(list_orders_handler))
        .route("/orders/myorders", get(my_orders_handler))
        .route("/orders/{id}", get(get_order_handler))
        .with_state(service)
}
