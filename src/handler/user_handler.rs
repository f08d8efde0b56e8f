use axum::{extract::{Path, State, Json}, response::IntoResponse, Extension};
use crate::service::user_service::{UserServiceImpl, UserService};
use std::sync::Arc;
use crate::middlewares::access_gate::AuthUser;
use crate::util::error::{HandlerError, HandlerErrorKind};
use bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;


#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 32))]
    pub role: String,
}

fn parse_user_id(id: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(id).map_err(|_| HandlerError {
        error: HandlerErrorKind::NotFound,
        message: "User not found".to_string(),
        details: None,
    })
}


// Admin: all accounts, password hashes stripped
pub async fn list_users_handler(
    State(service): State<Arc<UserServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let users = service.list_users().await?;
    Ok(Json(users))
}


pub async fn get_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_user_id(&id)?;
    let user = service.get_user(id).await?;
    Ok(Json(user))
}


// Admin: remove an account; admin accounts are off limits
pub async fn delete_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_user_id(&id)?;
    service.delete_user(id).await?;
    Ok(Json(json!({ "message": "User removed" })))
}


// Admin: change an account's role; self-demotion is refused
pub async fn update_user_role_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let id = parse_user_id(&id)?;
    let user = service.update_role(auth.id, id, &payload.role).await?;
    Ok(Json(user))
}
