use axum::{extract::{State, Json}, response::IntoResponse};
use std::sync::Arc;
use crate::util::email::EmailService;
use crate::util::error::{HandlerError, HandlerErrorKind};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;


#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 2, max = 64))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 2000))]
    pub message: String,
}


// Relay a storefront contact-form message to the shop inbox
pub async fn contact_handler(
    State(email_service): State<Arc<dyn EmailService>>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    email_service
        .send_contact_message(&payload.name, &payload.email, &payload.message)
        .await
        .map_err(|e| HandlerError {
            error: HandlerErrorKind::Internal,
            message: format!("Failed to send message: {}", e),
            details: None,
        })?;
    Ok(Json(json!({ "message": "Message sent successfully" })))
}
