pub mod repository_error;
pub mod user_repo;
pub mod product_repo;
pub mod order_repo;
