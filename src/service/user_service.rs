use tracing::{info, error, instrument};
use crate::repository::user_repo::UserRepository;
use std::sync::Arc;

use crate::model::user::UserRole;
use crate::service::auth_service::UserView;
use crate::util::error::ServiceError;
use async_trait::async_trait;
use bson::oid::ObjectId;

/// Admin-side account management. Password hashes never leave this layer;
/// everything goes out as a [`UserView`].
#[async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserView>, ServiceError>;
    async fn get_user(&self, id: ObjectId) -> Result<UserView, ServiceError>;
    async fn delete_user(&self, id: ObjectId) -> Result<(), ServiceError>;
    async fn update_role(&self, actor_id: ObjectId, target_id: ObjectId, role: &str) -> Result<UserView, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserView>, ServiceError> {
        info!("Listing users");
        let users = self.user_repo.list().await;
        match &users {
            Ok(list) => info!("Fetched {} users", list.len()),
            Err(e) => error!("Failed to list users: {e}"),
        }
        Ok(users?.iter().map(UserView::from).collect())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_user(&self, id: ObjectId) -> Result<UserView, ServiceError> {
        info!("Fetching user");
        let user = self.user_repo.find_by_id(&id).await;
        match &user {
            Ok(Some(_)) => info!("User found"),
            Ok(None) => error!("User not found: {}", id),
            Err(e) => error!("Failed to fetch user: {e}"),
        }
        let user = user?.ok_or(ServiceError::NotFound("User not found".to_string()))?;
        Ok(UserView::from(&user))
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_user(&self, id: ObjectId) -> Result<(), ServiceError> {
        info!("Deleting user");
        let user = self.user_repo.find_by_id(&id).await?
            .ok_or(ServiceError::NotFound("User not found".to_string()))?;
        if user.role.is_admin() {
            error!("Refusing to delete admin account {}", id);
            return Err(ServiceError::InvalidInput("Cannot delete admin user".to_string()));
        }

        let result = self.user_repo.delete(id).await;
        match &result {
            Ok(_) => info!("User deleted successfully"),
            Err(e) => error!("Failed to delete user: {e}"),
        }
        Ok(result?)
    }

    #[instrument(skip(self), fields(actor_id = %actor_id, target_id = %target_id, role = %role))]
    async fn update_role(&self, actor_id: ObjectId, target_id: ObjectId, role: &str) -> Result<UserView, ServiceError> {
        info!("Updating user role");
        let new_role = UserRole::parse(role)
            .ok_or(ServiceError::InvalidInput(format!("Invalid role: {}", role)))?;

        // An admin may promote or demote anyone but themselves; stripping your
        // own admin role mid-session would lock the store out of management.
        if actor_id == target_id && !new_role.is_admin() {
            error!("Admin {} attempted to demote their own account", actor_id);
            return Err(ServiceError::InvalidInput("Cannot demote yourself".to_string()));
        }

        let mut user = self.user_repo.find_by_id(&target_id).await?
            .ok_or(ServiceError::NotFound("User not found".to_string()))?;
        let result = self.user_repo.update_role(target_id, new_role).await;
        match &result {
            Ok(_) => info!("User role updated successfully"),
            Err(e) => error!("Failed to update user role: {e}"),
        }
        result?;

        user.role = new_role;
        Ok(UserView::from(&user))
    }
}
