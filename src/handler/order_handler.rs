use axum::{extract::{Path, State, Json}, http::StatusCode, response::IntoResponse, Extension};
use crate::service::order_service::{OrderServiceImpl, OrderService, Purchaser};
use std::sync::Arc;
use crate::dto::order_dto::PlaceOrderRequest;
use crate::middlewares::access_gate::AuthUser;
use crate::util::error::{HandlerError, HandlerErrorKind};
use bson::oid::ObjectId;
use serde_json::json;
use validator::Validate;


fn parse_order_id(id: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(id).map_err(|_| HandlerError {
        error: HandlerErrorKind::NotFound,
        message: "Order not found".to_string(),
        details: None,
    })
}

fn purchaser_from(auth: AuthUser) -> Purchaser {
    Purchaser {
        id: auth.id,
        username: auth.username,
        email: auth.email,
        role: auth.role,
    }
}


// Place an order for the signed-in account
pub async fn place_order_handler(
    State(service): State<Arc<OrderServiceImpl>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let order = service.place_order(purchaser_from(auth), payload).await?;
    let order_id = order.id.map(|id| id.to_hex()).unwrap_or_default();
    Ok((StatusCode::CREATED, Json(json!({ "orderId": order_id, "order": order }))))
}


// The signed-in account's own order history, newest first
pub async fn my_orders_handler(
    State(service): State<Arc<OrderServiceImpl>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HandlerError> {
    let orders = service.my_orders(auth.id).await?;
    Ok(Json(orders))
}


// One order; owners see their own, admins see any
pub async fn get_order_handler(
    State(service): State<Arc<OrderServiceImpl>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_order_id(&id)?;
    let order = service.get_order(id, &purchaser_from(auth)).await?;
    Ok(Json(order))
}


// Admin: every order in the store
pub async fn list_orders_handler(
    State(service): State<Arc<OrderServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let orders = service.list_all_orders().await?;
    Ok(Json(orders))
}
