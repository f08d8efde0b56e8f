use axum::{extract::{State, Json}, http::StatusCode, response::IntoResponse};
use crate::service::auth_service::{AuthServiceImpl, AuthService};
use std::sync::Arc;
use crate::util::error::{HandlerError, HandlerErrorKind};
use serde::Deserialize;
use validator::Validate;


#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name shown on orders and emails
    #[validate(length(min = 2, max = 64))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 4, max = 10))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}


// Register: creates the account and mails the OTP; no token yet
pub async fn register_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let res = service.register(payload.name, payload.email, payload.password, payload.phone).await?;
    Ok((StatusCode::CREATED, Json(res)))
}


// Verify OTP: flips the account to verified and signs the first token
pub async fn verify_otp_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let res = service.verify_otp(payload.email, payload.otp).await?;
    Ok(Json(res))
}


// Login
pub async fn login_handler(
    State(service): State<Arc<AuthServiceImpl>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        return Err(HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: format!("Validation error: {}", e),
            details: None,
        });
    }
    let res = service.login(payload.email, payload.password).await?;
    Ok(Json(res))
}
