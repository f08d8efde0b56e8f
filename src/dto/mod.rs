pub mod order_dto;
pub mod product_dto;
