use axum::{Router, routing::post};
use crate::handler::auth_handler::{
    register_handler,
    verify_otp_handler,
    login_handler,
};
use std::sync::Arc;
use crate::service::auth_service::AuthServiceImpl;

pub fn auth_router(service: Arc<AuthServiceImpl>) -> Router {
    // All three are public; the gate never asks for a token here
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/verify-otp", post(verify_otp_handler))
        .route("/auth/login", post(login_handler))
        .with_state(service)
}
