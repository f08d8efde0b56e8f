pub mod auth_router;
pub mod product_router;
pub mod order_router;
pub mod user_router;
pub mod contact_router;
