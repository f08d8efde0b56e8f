use axum::{Router, routing::post};
use crate::handler::contact_handler::contact_handler;
use std::sync::Arc;
use crate::util::email::EmailService;

pub fn contact_router(email_service: Arc<dyn EmailService>) -> Router {
    Router::new()
        .route("/contact", post(contact_handler))
        .with_state(email_service)
}
