use tracing::{info, error, instrument};
use crate::repository::product_repo::ProductRepository;
use std::sync::Arc;

use crate::dto::product_dto::{CreateProductRequest, UpdateProductRequest};
use crate::model::product::Product;
use crate::util::error::ServiceError;
use async_trait::async_trait;
use bson::oid::ObjectId;

#[async_trait]
pub trait ProductService: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError>;
    async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, ServiceError>;
    async fn get_product(&self, id: ObjectId) -> Result<Product, ServiceError>;
    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, ServiceError>;
    async fn update_product(&self, id: ObjectId, request: UpdateProductRequest) -> Result<Product, ServiceError>;
    async fn delete_product(&self, id: ObjectId) -> Result<(), ServiceError>;
}

pub struct ProductServiceImpl {
    pub product_repo: Arc<dyn ProductRepository>,
}

impl ProductServiceImpl {
    pub fn new(product_repo: Arc<dyn ProductRepository>) -> Self {
        Self { product_repo }
    }
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        info!("Listing catalog");
        let products = self.product_repo.list().await;
        match &products {
            Ok(list) => info!("Fetched {} products", list.len()),
            Err(e) => error!("Failed to list products: {e}"),
        }
        Ok(products?)
    }

    #[instrument(skip(self), fields(keyword = %keyword))]
    async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, ServiceError> {
        info!("Searching catalog");
        let products = self.product_repo.search(keyword).await;
        match &products {
            Ok(list) => info!("Found {} products", list.len()),
            Err(e) => error!("Failed to search products: {e}"),
        }
        Ok(products?)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_product(&self, id: ObjectId) -> Result<Product, ServiceError> {
        info!("Fetching product");
        let product = self.product_repo.get_by_id(id).await;
        match &product {
            Ok(_) => info!("Product found"),
            Err(e) => error!("Failed to fetch product: {e}"),
        }
        Ok(product?)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, ServiceError> {
        info!("Creating product");
        let product = Product {
            id: None,
            name: request.name.trim().to_string(),
            description: request.description,
            category: request.category,
            price: request.price,
            count_in_stock: request.count_in_stock,
            image: request.image,
            rating: 0.0,
            num_reviews: 0,
            created_at: None,
            updated_at: None,
        };

        // Duplicate names bounce off the unique index
        let created = self.product_repo.create(product).await;
        match &created {
            Ok(_) => info!("Product created successfully"),
            Err(e) => error!("Failed to create product: {e}"),
        }
        Ok(created?)
    }

    #[instrument(skip(self, request), fields(id = %id))]
    async fn update_product(&self, id: ObjectId, request: UpdateProductRequest) -> Result<Product, ServiceError> {
        info!("Updating product");
        let mut product = self.product_repo.get_by_id(id).await?;

        if let Some(name) = request.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            product.description = description;
        }
        if let Some(category) = request.category {
            product.category = category;
        }
        if let Some(price) = request.price {
            product.price = price;
        }
        if let Some(count_in_stock) = request.count_in_stock {
            product.count_in_stock = count_in_stock;
        }
        if let Some(image) = request.image {
            product.image = Some(image);
        }
        product.updated_at = Some(chrono::Local::now().to_rfc3339());

        let updated = self.product_repo.update(id, product).await;
        match &updated {
            Ok(_) => info!("Product updated successfully"),
            Err(e) => error!("Failed to update product: {e}"),
        }
        Ok(updated?)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_product(&self, id: ObjectId) -> Result<(), ServiceError> {
        info!("Deleting product");
        let result = self.product_repo.delete(id).await;
        match &result {
            Ok(_) => info!("Product deleted successfully"),
            Err(e) => error!("Failed to delete product: {e}"),
        }
        Ok(result?)
    }
}
