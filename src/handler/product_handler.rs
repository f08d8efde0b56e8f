use axum::{extract::{Path, Query, State, Json}, http::StatusCode, response::IntoResponse};
use crate::service::product_service::{ProductServiceImpl, ProductService};
use std::sync::Arc;
use crate::dto::product_dto::{CreateProductRequest, UpdateProductRequest};
use crate::util::error::{HandlerError, HandlerErrorKind};
use bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;


#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub keyword: Option<String>,
}

// Bad ids answer the same as absent products
fn parse_product_id(id: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(id).map_err(|_| HandlerError {
        error: HandlerErrorKind::NotFound,
        message: "Product not found".to_string(),
        details: None,
    })
}


// Public catalog: full list, or a case-insensitive name search via ?keyword=
pub async fn list_products_handler(
    State(service): State<Arc<ProductServiceImpl>>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let products = match query.keyword.as_deref().map(str::trim) {
        Some(keyword) if !keyword.is_empty() => service.search_products(keyword).await?,
        _ => service.list_products().await?,
    };
    Ok(Json(products))
}


pub async fn get_product_handler(
    State(service): State<Arc<ProductServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_product_id(&id)?;
    let product = service.get_product(id).await?;
    Ok(Json(product))
}


// Admin: add a product to the catalog
pub async fn create_product_handler(
    State(service): State<Arc<ProductServiceImpl>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let product = service.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}


// Admin: partial update; absent fields keep their stored value
pub async fn update_product_handler(
    State(service): State<Arc<ProductServiceImpl>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let id = parse_product_id(&id)?;
    let product = service.update_product(id, payload).await?;
    Ok(Json(product))
}


// Admin: remove a product
pub async fn delete_product_handler(
    State(service): State<Arc<ProductServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_product_id(&id)?;
    service.delete_product(id).await?;
    Ok(Json(json!({ "message": "Product removed" })))
}
