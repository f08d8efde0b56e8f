use crate::model::product::Product;
use crate::repository::repository_error::{
    RepositoryError, RepositoryResult,
};
use crate::config::mongo_conf::MongoConfig;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::{info, error, warn};
use futures::stream::StreamExt;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: Product) -> RepositoryResult<Product>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Product>;
    async fn update(&self, id: ObjectId, product: Product) -> RepositoryResult<Product>;
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()>;
    async fn list(&self) -> RepositoryResult<Vec<Product>>;
    async fn search(&self, keyword: &str) -> RepositoryResult<Vec<Product>>;
    /// Conditionally take `quantity` units off the shelf. Returns false when
    /// the product is missing or holds fewer units than requested; the filter
    /// and the decrement are a single server-side operation, so concurrent
    /// callers can never drive the count negative.
    async fn decrement_stock(&self, id: ObjectId, quantity: i64) -> RepositoryResult<bool>;
    /// Put units back after a failed placement
    async fn increment_stock(&self, id: ObjectId, quantity: i64) -> RepositoryResult<()>;
}

pub struct MongoProductRepository {
    collection: mongodb::Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository using MongoConfig
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        use mongodb::{options::{ClientOptions, Credential, IndexOptions, ResolverConfig}, Client, IndexModel};

        let mut client_options = ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
        client_options.app_name = Some("FarmNestBackend".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));

        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            client_options.credential = Some(Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build());
        }

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database);
        let collection = db.collection::<Product>("products");

        let name_index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(name_index, None).await?;

        Ok(MongoProductRepository { collection })
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {

    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        info!("Creating new product");
        let mut new_product = product.clone();
        new_product.id = Some(ObjectId::new());
        let time = chrono::Local::now();
        new_product.created_at = Some(time.to_rfc3339());
        new_product.updated_at = Some(time.to_rfc3339());

        let result = self.collection.insert_one(new_product.clone(), None).await;
        match result {
            Ok(_) => {
                info!("Product created successfully");
                Ok(new_product)
            },
            Err(e) => {
                error!("Failed to create product: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Product> {
        let filter = doc! { "_id": id };
        let result = self.collection.find_one(filter, None).await;
        match result {
            Ok(Some(product)) => Ok(product),
            Ok(None) => {
                warn!("Product not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("Product not found for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to fetch product by ID: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch product by ID: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self, product), fields(id = %id))]
    async fn update(&self, id: ObjectId, product: Product) -> RepositoryResult<Product> {
        info!("Updating product with ID: {}", id);
        let filter = doc! { "_id": id };
        let mut doc = bson::to_document(&product).map_err(|e| RepositoryError::serialization(format!("Failed to serialize product: {}", e)))?;
        doc.remove("_id");
        let update = doc! { "$set": doc };
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => {
                info!("Product updated successfully for ID: {}", id);
                Ok(product)
            },
            Ok(_) => {
                error!("No product found to update for ID: {}", id);
                Err(RepositoryError::not_found(format!("No product found to update for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to update product: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        info!("Deleting product with ID: {}", id);
        let filter = doc! { "_id": id };
        let result = self.collection.delete_one(filter, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => {
                info!("Product deleted successfully for ID: {}", id);
                Ok(())
            },
            Ok(_) => {
                error!("No product found to delete for ID: {}", id);
                Err(RepositoryError::not_found(format!("No product found to delete for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to delete product: {}", e);
                Err(RepositoryError::database(format!("Failed to delete product: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<Product>> {
        info!("Listing products");
        let cursor = self.collection.find(None, None).await;
        match cursor {
            Ok(mut cursor) => {
                let mut products = Vec::new();
                while let Some(product) = cursor.next().await {
                    match product {
                        Ok(p) => products.push(p),
                        Err(e) => {
                            error!("Failed to deserialize product: {}", e);
                            return Err(RepositoryError::serialization(format!("Failed to deserialize product: {}", e)));
                        }
                    }
                }
                info!("Fetched {} products", products.len());
                Ok(products)
            },
            Err(e) => {
                error!("Failed to list products: {}", e);
                Err(RepositoryError::database(format!("Failed to list products: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(keyword = %keyword))]
    async fn search(&self, keyword: &str) -> RepositoryResult<Vec<Product>> {
        info!("Searching products by keyword");
        let filter = doc! { "name": { "$regex": keyword, "$options": "i" } };
        let cursor = self.collection.find(filter, None).await;
        match cursor {
            Ok(mut cursor) => {
                let mut products = Vec::new();
                while let Some(product) = cursor.next().await {
                    match product {
                        Ok(p) => products.push(p),
                        Err(e) => {
                            error!("Failed to deserialize product: {}", e);
                            return Err(RepositoryError::serialization(format!("Failed to deserialize product: {}", e)));
                        }
                    }
                }
                info!("Found {} products for keyword", products.len());
                Ok(products)
            },
            Err(e) => {
                error!("Failed to search products: {}", e);
                Err(RepositoryError::database(format!("Failed to search products: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, quantity = quantity))]
    async fn decrement_stock(&self, id: ObjectId, quantity: i64) -> RepositoryResult<bool> {
        info!("Taking {} units of product {}", quantity, id);
        let filter = doc! { "_id": id, "count_in_stock": { "$gte": quantity } };
        let update = doc! {
            "$inc": { "count_in_stock": -quantity },
            "$set": { "updated_at": chrono::Local::now().to_rfc3339() },
        };
        let result = self.collection.find_one_and_update(filter, update, None).await;
        match result {
            Ok(Some(_)) => {
                info!("Stock decremented for product {}", id);
                Ok(true)
            },
            Ok(None) => {
                warn!("Stock decrement refused for product {} (missing or short)", id);
                Ok(false)
            },
            Err(e) => {
                error!("Failed to decrement stock: {}", e);
                Err(RepositoryError::database(format!("Failed to decrement stock: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, quantity = quantity))]
    async fn increment_stock(&self, id: ObjectId, quantity: i64) -> RepositoryResult<()> {
        info!("Returning {} units of product {}", quantity, id);
        let filter = doc! { "_id": id };
        let update = doc! {
            "$inc": { "count_in_stock": quantity },
            "$set": { "updated_at": chrono::Local::now().to_rfc3339() },
        };
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => {
                info!("Stock restored for product {}", id);
                Ok(())
            },
            Ok(_) => {
                error!("No product found to restore stock for ID: {}", id);
                Err(RepositoryError::not_found(format!("No product found to restore stock for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to restore stock: {}", e);
                Err(RepositoryError::database(format!("Failed to restore stock: {}", e)))
            }
        }
    }
}
