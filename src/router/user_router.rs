use axum::{Router, routing::{get, put, delete}};
use crate::handler::user_handler::{
    list_users_handler,
    get_user_handler,
    delete_user_handler,
    update_user_role_handler,
};
use std::sync::Arc;
use crate::service::user_service::UserServiceImpl;

pub fn user_router(service: Arc<UserServiceImpl>) -> Router {
    // Every row here is admin-only in the gate's policy table
    Router::new()
        .route("/users", get(list_users_handler))
        .route("/users/{id}", get(get_user_handler))
        .route("/users/{id}", delete(delete_user_handler))
        .route("/users/{id}/role", put(update_user_role_handler))
        .with_state(service)
}
