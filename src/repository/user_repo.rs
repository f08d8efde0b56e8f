use crate::model::user::{User, UserRole};
use crate::repository::repository_error::{RepositoryResult, RepositoryError};
use crate::config::mongo_conf::MongoConfig;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use tracing::{error, info};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn update(&self, id: ObjectId, user: User) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
    async fn list(&self) -> RepositoryResult<Vec<User>>;
    /// Flip the account to verified and clear the outstanding OTP in one update
    async fn mark_verified(&self, id: ObjectId) -> RepositoryResult<()>;
    async fn update_role(&self, id: ObjectId, role: UserRole) -> RepositoryResult<()>;
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()>;
}

pub struct UserRepositoryImpl {
    collection: mongodb::Collection<User>,
}

impl UserRepositoryImpl {
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
        let collection = db.collection::<User>("users");

        // unique email; concurrent duplicate inserts surface as E11000
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(email_index, None).await?;

        Ok(UserRepositoryImpl { collection })
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        use chrono::Local;
        user.id = Some(ObjectId::new());
        let now = Local::now().to_rfc3339();
        user.created_at = Some(now.clone());
        user.updated_at = Some(now);
        let result = self.collection.insert_one(user.clone(), None).await;
        match result {
            Ok(_) => {
                info!("User inserted successfully");
                Ok(user)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self, user), fields(id = %id))]
    async fn update(&self, id: ObjectId, user: User) -> RepositoryResult<User> {
        let filter = doc! { "_id": id };
        let mut doc = bson::to_document(&user).map_err(|e| RepositoryError::serialization(format!("Failed to serialize user: {}", e)))?;
        doc.remove("_id");
        let update = doc! { "$set": doc };
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(user),
            Ok(_) => Err(RepositoryError::not_found(format!("No user found to update for ID: {}", id))),
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let filter = doc! { "email": email };
        let user = self.collection.find_one(filter, None).await.map_err(|e| RepositoryError::database(format!("Failed to find user by email: {}", e)))?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let filter = doc! { "_id": id };
        let user = self.collection.find_one(filter, None).await.map_err(|e| RepositoryError::database(format!("Failed to find user by id: {}", e)))?;
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<User>> {
        info!("Listing all users");
        let cursor = self.collection.find(None, None).await;
        match cursor {
            Ok(mut cursor) => {
                let mut users = Vec::new();
                while let Some(user) = cursor.next().await {
                    match user {
                        Ok(u) => users.push(u),
                        Err(e) => {
                            error!("Failed to deserialize user: {}", e);
                            return Err(RepositoryError::serialization(format!("Failed to deserialize user: {}", e)));
                        }
                    }
                }
                info!("Fetched {} users", users.len());
                Ok(users)
            }
            Err(e) => {
                error!("Failed to list users: {}", e);
                Err(RepositoryError::database(format!("Failed to list users: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn mark_verified(&self, id: ObjectId) -> RepositoryResult<()> {
        info!("Marking user as verified");
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "is_verified": true,
            "otp_code": bson::Bson::Null,
            "otp_expires_at": bson::Bson::Null,
            "updated_at": chrono::Local::now().to_rfc3339(),
        } };
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => {
                info!("User marked verified for ID: {}", id);
                Ok(())
            }
            Ok(_) => {
                error!("No user found to verify for ID: {}", id);
                Err(RepositoryError::not_found(format!("No user found to verify for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to mark user verified: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, role = %role))]
    async fn update_role(&self, id: ObjectId, role: UserRole) -> RepositoryResult<()> {
        info!("Updating user role");
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "role": role.as_str(),
            "updated_at": chrono::Local::now().to_rfc3339(),
        } };
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => {
                info!("User role updated for ID: {}", id);
                Ok(())
            }
            Ok(_) => {
                error!("No user found to update role for ID: {}", id);
                Err(RepositoryError::not_found(format!("No user found to update role for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to update user role: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        info!("Deleting user with ID: {}", id);
        let filter = doc! { "_id": id };
        let result = self.collection.delete_one(filter, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => {
                info!("User deleted successfully for ID: {}", id);
                Ok(())
            }
            Ok(_) => {
                error!("No user found to delete for ID: {}", id);
                Err(RepositoryError::not_found(format!("No user found to delete for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to delete user: {}", e);
                Err(RepositoryError::database(format!("Failed to delete user: {}", e)))
            }
        }
    }
}
