pub mod auth_service;
pub mod user_service;
pub mod product_service;
pub mod order_service;

pub use auth_service::{AuthService, AuthServiceImpl};
pub use user_service::{UserService, UserServiceImpl};
pub use product_service::{ProductService, ProductServiceImpl};
pub use order_service::{OrderService, OrderServiceImpl};
