#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::{middleware, routing::get, Router};
use bson::oid::ObjectId;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use farmnest_backend::config::jwt_conf::JwtConfig;
use farmnest_backend::config::otp_conf::OtpConfig;
use farmnest_backend::middlewares::access_gate::{access_gate, AccessGateState};
use farmnest_backend::model::order::Order;
use farmnest_backend::model::product::Product;
use farmnest_backend::model::user::{User, UserRole};
use farmnest_backend::repository::order_repo::OrderRepository;
use farmnest_backend::repository::product_repo::ProductRepository;
use farmnest_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use farmnest_backend::repository::user_repo::UserRepository;
use farmnest_backend::router::auth_router::auth_router;
use farmnest_backend::router::contact_router::contact_router;
use farmnest_backend::router::order_router::order_router;
use farmnest_backend::router::product_router::product_router;
use farmnest_backend::router::user_router::user_router;
use farmnest_backend::service::auth_service::AuthServiceImpl;
use farmnest_backend::service::order_service::OrderServiceImpl;
use farmnest_backend::service::product_service::ProductServiceImpl;
use farmnest_backend::service::user_service::UserServiceImpl;
use farmnest_backend::util::email::{EmailError, EmailMessage, EmailService};
use farmnest_backend::util::jwt::JwtTokenUtilsImpl;
use farmnest_backend::util::password::{PasswordUtils, PasswordUtilsImpl};

// ---------------------------------------------------------------------------
// In-memory repositories. They honor the same contracts as the Mongo ones
// (unique email / unique product name, conditional stock decrement) so the
// services and routers can be exercised without a running database.
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::already_exists(format!(
                "Duplicate key: {}",
                user.email
            )));
        }
        user.id = Some(ObjectId::new());
        let now = chrono::Local::now().to_rfc3339();
        user.created_at = Some(now.clone());
        user.updated_at = Some(now);
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: ObjectId, user: User) -> RepositoryResult<User> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == Some(id)) {
            Some(slot) => {
                let mut updated = user;
                updated.id = Some(id);
                updated.updated_at = Some(chrono::Local::now().to_rfc3339());
                *slot = updated.clone();
                Ok(updated)
            }
            None => Err(RepositoryError::not_found(format!("No user with id {}", id))),
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn mark_verified(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == Some(id)) {
            Some(user) => {
                user.is_verified = true;
                user.otp_code = None;
                user.otp_expires_at = None;
                user.updated_at = Some(chrono::Local::now().to_rfc3339());
                Ok(())
            }
            None => Err(RepositoryError::not_found(format!("No user with id {}", id))),
        }
    }

    async fn update_role(&self, id: ObjectId, role: UserRole) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == Some(id)) {
            Some(user) => {
                user.role = role;
                user.updated_at = Some(chrono::Local::now().to_rfc3339());
                Ok(())
            }
            None => Err(RepositoryError::not_found(format!("No user with id {}", id))),
        }
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != Some(id));
        if users.len() == before {
            return Err(RepositoryError::not_found(format!("No user with id {}", id)));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock_of(&self, id: ObjectId) -> Option<i64> {
        let products = self.products.lock().unwrap();
        products
            .iter()
            .find(|p| p.id == Some(id))
            .map(|p| p.count_in_stock)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        let mut products = self.products.lock().unwrap();
        if products.iter().any(|p| p.name == product.name) {
            return Err(RepositoryError::already_exists(format!(
                "Duplicate key: {}",
                product.name
            )));
        }
        let mut created = product;
        created.id = Some(ObjectId::new());
        let now = chrono::Local::now().to_rfc3339();
        created.created_at = Some(now.clone());
        created.updated_at = Some(now);
        products.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Product> {
        let products = self.products.lock().unwrap();
        products
            .iter()
            .find(|p| p.id == Some(id))
            .cloned()
            .ok_or(RepositoryError::not_found(format!("Product not found for ID: {}", id)))
    }

    async fn update(&self, id: ObjectId, product: Product) -> RepositoryResult<Product> {
        let mut products = self.products.lock().unwrap();
        match products.iter_mut().find(|p| p.id == Some(id)) {
            Some(slot) => {
                let mut updated = product;
                updated.id = Some(id);
                *slot = updated.clone();
                Ok(updated)
            }
            None => Err(RepositoryError::not_found(format!("No product found to update for ID: {}", id))),
        }
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != Some(id));
        if products.len() == before {
            return Err(RepositoryError::not_found(format!("No product found to delete for ID: {}", id)));
        }
        Ok(())
    }

    async fn list(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self.products.lock().unwrap().clone())
    }

    async fn search(&self, keyword: &str) -> RepositoryResult<Vec<Product>> {
        let needle = keyword.to_lowercase();
        let products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn decrement_stock(&self, id: ObjectId, quantity: i64) -> RepositoryResult<bool> {
        // Check and decrement under one lock, like the guarded Mongo update
        let mut products = self.products.lock().unwrap();
        match products.iter_mut().find(|p| p.id == Some(id)) {
            Some(product) if product.count_in_stock >= quantity => {
                product.count_in_stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_stock(&self, id: ObjectId, quantity: i64) -> RepositoryResult<()> {
        let mut products = self.products.lock().unwrap();
        match products.iter_mut().find(|p| p.id == Some(id)) {
            Some(product) => {
                product.count_in_stock += quantity;
                Ok(())
            }
            None => Err(RepositoryError::not_found(format!("No product found to restore stock for ID: {}", id))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: Order) -> RepositoryResult<Order> {
        let mut orders = self.orders.lock().unwrap();
        let mut created = order;
        created.id = Some(ObjectId::new());
        let now = chrono::Local::now().to_rfc3339();
        created.created_at = Some(now.clone());
        created.updated_at = Some(now);
        orders.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Order> {
        let orders = self.orders.lock().unwrap();
        orders
            .iter()
            .find(|o| o.id == Some(id))
            .cloned()
            .ok_or(RepositoryError::not_found(format!("Order not found for ID: {}", id)))
    }

    async fn list_for_user(&self, user_id: ObjectId) -> RepositoryResult<Vec<Order>> {
        let orders = self.orders.lock().unwrap();
        // Newest first, matching the Mongo sort
        Ok(orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let orders = self.orders.lock().unwrap();
        Ok(orders.iter().rev().cloned().collect())
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|o| o.id != Some(id));
        if orders.len() == before {
            return Err(RepositoryError::not_found(format!("No order found to delete for ID: {}", id)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mail doubles
// ---------------------------------------------------------------------------

/// Captures outbound mail instead of talking SMTP
#[derive(Default)]
pub struct RecordingMailer {
    pub otp_codes: Mutex<Vec<(String, String)>>,
    pub contact_messages: Mutex<Vec<(String, String, String)>>,
    pub raw_messages: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        let codes = self.otp_codes.lock().unwrap();
        codes
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn otp_count(&self) -> usize {
        self.otp_codes.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailService for RecordingMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.raw_messages.lock().unwrap().push(message);
        Ok(())
    }

    async fn send_verification_email(
        &self,
        to: &str,
        _username: &str,
        code: &str,
        _expires_minutes: i64,
    ) -> Result<(), EmailError> {
        self.otp_codes
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }

    async fn send_contact_message(
        &self,
        name: &str,
        reply_to: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        self.contact_messages.lock().unwrap().push((
            name.to_string(),
            reply_to.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Refuses every send, for exercising delivery-failure paths
pub struct FailingMailer;

#[async_trait]
impl EmailService for FailingMailer {
    async fn send_email(&self, _message: EmailMessage) -> Result<(), EmailError> {
        Err(EmailError::SmtpError("connection refused".to_string()))
    }

    async fn send_verification_email(
        &self,
        _to: &str,
        _username: &str,
        _code: &str,
        _expires_minutes: i64,
    ) -> Result<(), EmailError> {
        Err(EmailError::SmtpError("connection refused".to_string()))
    }

    async fn send_contact_message(
        &self,
        _name: &str,
        _reply_to: &str,
        _body: &str,
    ) -> Result<(), EmailError> {
        Err(EmailError::SmtpError("connection refused".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Builders and wiring helpers
// ---------------------------------------------------------------------------

pub fn test_jwt_utils() -> JwtTokenUtilsImpl {
    JwtTokenUtilsImpl::from_test_env().unwrap_or_else(|_| JwtTokenUtilsImpl::new(JwtConfig::default()))
}

pub fn test_otp_config() -> OtpConfig {
    OtpConfig::from_test_env()
}

pub fn test_product(name: &str, price: f64, count_in_stock: i64) -> Product {
    Product {
        id: None,
        name: name.to_string(),
        description: format!("{} from a local farm", name),
        category: "produce".to_string(),
        price,
        count_in_stock,
        image: None,
        rating: 0.0,
        num_reviews: 0,
        created_at: None,
        updated_at: None,
    }
}

pub async fn seed_user(
    repo: &dyn UserRepository,
    username: &str,
    email: &str,
    password: &str,
    role: UserRole,
    verified: bool,
) -> User {
    let password_hash = PasswordUtilsImpl::hash_password(password).unwrap();
    let user = User {
        id: None,
        username: username.to_string(),
        email: email.to_string(),
        phone: None,
        password_hash,
        role,
        is_verified: verified,
        otp_code: None,
        otp_expires_at: None,
        created_at: None,
        updated_at: None,
    };
    repo.insert(user).await.unwrap()
}

/// Everything a test needs to drive the full HTTP surface
pub struct TestBackend {
    pub router: Router,
    pub user_repo: Arc<InMemoryUserRepository>,
    pub product_repo: Arc<InMemoryProductRepository>,
    pub order_repo: Arc<InMemoryOrderRepository>,
    pub mailer: Arc<RecordingMailer>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
}

/// Assemble the same router the app serves, on in-memory stores
pub fn test_backend() -> TestBackend {
    let user_repo = Arc::new(InMemoryUserRepository::new());
    let product_repo = Arc::new(InMemoryProductRepository::new());
    let order_repo = Arc::new(InMemoryOrderRepository::new());
    let mailer = Arc::new(RecordingMailer::new());
    let jwt_utils = Arc::new(test_jwt_utils());

    let auth_service = Arc::new(AuthServiceImpl::new(
        user_repo.clone() as Arc<dyn UserRepository>,
        jwt_utils.clone(),
        mailer.clone() as Arc<dyn EmailService>,
        test_otp_config(),
    ));
    let user_service = Arc::new(UserServiceImpl::new(user_repo.clone() as Arc<dyn UserRepository>));
    let product_service = Arc::new(ProductServiceImpl::new(
        product_repo.clone() as Arc<dyn ProductRepository>,
    ));
    let order_service = Arc::new(OrderServiceImpl::new(
        order_repo.clone() as Arc<dyn OrderRepository>,
        product_repo.clone() as Arc<dyn ProductRepository>,
    ));

    let gate_state = Arc::new(AccessGateState {
        jwt_utils: jwt_utils.clone(),
        user_repo: user_repo.clone() as Arc<dyn UserRepository>,
    });

    let router = Router::new()
        .merge(auth_router(auth_service))
        .merge(product_router(product_service))
        .merge(order_router(order_service))
        .merge(user_router(user_service))
        .merge(contact_router(mailer.clone() as Arc<dyn EmailService>))
        .route("/health", get(|| async { "OK" }))
        .layer(middleware::from_fn_with_state(gate_state, access_gate));

    TestBackend {
        router,
        user_repo,
        product_repo,
        order_repo,
        mailer,
        jwt_utils,
    }
}

// ---------------------------------------------------------------------------
// Request plumbing for driving the router with .oneshot()
// ---------------------------------------------------------------------------

pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: &serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn bare_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn response_json(resp: Response) -> (StatusCode, serde_json::Value) {
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap(); // 1 MB limit
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

/// Sign in over HTTP and hand back the bearer token
pub async fn login_token(router: &Router, email: &str, password: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": password });
    let resp = router
        .clone()
        .oneshot(json_request("POST", "/auth/login", &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", json);
    json["token"].as_str().expect("token missing").to_string()
}
