use crate::model::order::Order;
use crate::repository::repository_error::{
    RepositoryError, RepositoryResult,
};
use crate::config::mongo_conf::MongoConfig;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use tracing::{info, error};
use futures::stream::StreamExt;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: Order) -> RepositoryResult<Order>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Order>;
    /// Orders for one purchaser, newest first
    async fn list_for_user(&self, user_id: ObjectId) -> RepositoryResult<Vec<Order>>;
    /// Every order in the store, newest first
    async fn list_all(&self) -> RepositoryResult<Vec<Order>>;
    /// Removal is only used to unwind a placement whose stock claim failed
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()>;
}

pub struct MongoOrderRepository {
    collection: mongodb::Collection<Order>,
}

impl MongoOrderRepository {
    /// Create a new MongoOrderRepository using MongoConfig
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        use mongodb::{options::{ClientOptions, Credential, ResolverConfig}, Client};

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
        let collection = db.collection::<Order>("orders");
        Ok(MongoOrderRepository { collection })
    }

    async fn collect(&self, mut cursor: mongodb::Cursor<Order>) -> RepositoryResult<Vec<Order>> {
        let mut orders = Vec::new();
        while let Some(order) = cursor.next().await {
            match order {
                Ok(o) => orders.push(o),
                Err(e) => {
                    error!("Failed to deserialize order: {}", e);
                    return Err(RepositoryError::serialization(format!("Failed to deserialize order: {}", e)));
                }
            }
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for MongoOrderRepository {

    #[tracing::instrument(skip(self, order), fields(user_id = %order.user_id, lines = order.items.len()))]
    async fn create(&self, order: Order) -> RepositoryResult<Order> {
        info!("Creating new order");
        let mut new_order = order.clone();
        new_order.id = Some(ObjectId::new());
        let time = chrono::Local::now();
        new_order.created_at = Some(time.to_rfc3339());
        new_order.updated_at = Some(time.to_rfc3339());

        let result = self.collection.insert_one(new_order.clone(), None).await;
        match result {
            Ok(_) => {
                info!("Order created successfully");
                Ok(new_order)
            },
            Err(e) => {
                error!("Failed to create order: {}", e);
                Err(RepositoryError::database(format!("Failed to create order: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Order> {
        let filter = doc! { "_id": id };
        let result = self.collection.find_one(filter, None).await;
        match result {
            Ok(Some(order)) => Ok(order),
            Ok(None) => {
                error!("Order not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("Order not found for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to fetch order by ID: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch order by ID: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    async fn list_for_user(&self, user_id: ObjectId) -> RepositoryResult<Vec<Order>> {
        info!("Listing orders for user");
        let filter = doc! { "user_id": user_id };
        // ObjectIds embed their creation instant, so _id desc is newest first
        let options = FindOptions::builder().sort(doc! { "_id": -1 }).build();
        let cursor = self.collection.find(filter, options).await;
        match cursor {
            Ok(cursor) => {
                let orders = self.collect(cursor).await?;
                info!("Fetched {} orders for user", orders.len());
                Ok(orders)
            },
            Err(e) => {
                error!("Failed to list orders for user: {}", e);
                Err(RepositoryError::database(format!("Failed to list orders for user: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        info!("Listing all orders");
        let options = FindOptions::builder().sort(doc! { "_id": -1 }).build();
        let cursor = self.collection.find(None, options).await;
        match cursor {
            Ok(cursor) => {
                let orders = self.collect(cursor).await?;
                info!("Fetched {} orders", orders.len());
                Ok(orders)
            },
            Err(e) => {
                error!("Failed to list orders: {}", e);
                Err(RepositoryError::database(format!("Failed to list orders: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        info!("Deleting order with ID: {}", id);
        let filter = doc! { "_id": id };
        let result = self.collection.delete_one(filter, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => {
                info!("Order deleted successfully for ID: {}", id);
                Ok(())
            },
            Ok(_) => {
                error!("No order found to delete for ID: {}", id);
                Err(RepositoryError::not_found(format!("No order found to delete for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to delete order: {}", e);
                Err(RepositoryError::database(format!("Failed to delete order: {}", e)))
            }
        }
    }
}
