pub mod user;
pub mod product;
pub mod order;
