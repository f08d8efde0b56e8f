use axum::{Router, routing::get, middleware};
use std::net::SocketAddr;
use tracing::info;
use crate::config::app_conf::AppConfig;
use crate::config::admin_user_conf::AdminUserConfig;
use crate::model::user::{User, UserRole};
use std::sync::Arc;

pub struct App {
    config: AppConfig,
    router: Router,
    pub auth_service: Arc<crate::service::auth_service::AuthServiceImpl>,
    pub user_service: Arc<crate::service::user_service::UserServiceImpl>,
    pub product_service: Arc<crate::service::product_service::ProductServiceImpl>,
    pub order_service: Arc<crate::service::order_service::OrderServiceImpl>,
}

impl App {
    pub async fn new() -> Self {
        let config = AppConfig::from_env();

        use crate::config::email_conf::EmailConfig;
        use crate::config::jwt_conf::JwtConfig;
        use crate::config::mongo_conf::MongoConfig;
        use crate::config::otp_conf::OtpConfig;
        use crate::repository::order_repo::MongoOrderRepository;
        use crate::repository::product_repo::{MongoProductRepository, ProductRepository};
        use crate::repository::user_repo::{UserRepositoryImpl, UserRepository};
        use crate::service::auth_service::AuthServiceImpl;
        use crate::service::order_service::OrderServiceImpl;
        use crate::service::product_service::ProductServiceImpl;
        use crate::service::user_service::UserServiceImpl;
        use crate::util::email::{EmailService, SmtpEmailService};
        use crate::util::jwt::JwtTokenUtilsImpl;

        let jwt_config = JwtConfig::from_env().expect("JWT config error");
        let mongo_config = MongoConfig::from_env().expect("Mongo config error");
        let email_config = EmailConfig::from_env().expect("Email config error");
        let otp_config = OtpConfig::from_env().expect("OTP config error");

        let user_repo = Arc::new(UserRepositoryImpl::new(&mongo_config).await.expect("User repo error")) as Arc<dyn UserRepository>;
        let product_repo = Arc::new(MongoProductRepository::new(&mongo_config).await.expect("Product repo error")) as Arc<dyn ProductRepository>;
        let order_repo = Arc::new(MongoOrderRepository::new(&mongo_config).await.expect("Order repo error"));

        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));
        let email_service = Arc::new(SmtpEmailService::new(email_config).expect("Email service error")) as Arc<dyn EmailService>;

        let auth_service = Arc::new(AuthServiceImpl::new(
            user_repo.clone(),
            jwt_utils.clone(),
            email_service.clone(),
            otp_config,
        ));
        let user_service = Arc::new(UserServiceImpl::new(user_repo.clone()));
        let product_service = Arc::new(ProductServiceImpl::new(product_repo.clone()));
        let order_service = Arc::new(OrderServiceImpl::new(order_repo, product_repo));

        use crate::middlewares::access_gate::AccessGateState;
        let gate_state = Arc::new(AccessGateState {
            jwt_utils: jwt_utils.clone(),
            user_repo: user_repo.clone(),
        });

        let mut app = App {
            config,
            router: Router::new(),
            auth_service,
            user_service,
            product_service,
            order_service,
        };
        app.router = app.create_router_with_gate(gate_state, email_service);
        app.create_first_admin_user(user_repo).await;
        app
    }


    fn create_router_with_gate(
        &self,
        gate_state: Arc<crate::middlewares::access_gate::AccessGateState>,
        email_service: Arc<dyn crate::util::email::EmailService>,
    ) -> Router {
        use crate::middlewares::access_gate::access_gate;
        use crate::router::auth_router::auth_router;
        use crate::router::contact_router::contact_router;
        use crate::router::order_router::order_router;
        use crate::router::product_router::product_router;
        use crate::router::user_router::user_router;
        Router::new()
            .merge(auth_router(self.auth_service.clone()))
            .merge(product_router(self.product_service.clone()))
            .merge(order_router(self.order_service.clone()))
            .merge(user_router(self.user_service.clone()))
            .merge(contact_router(email_service))
            .route("/health", get(|| async { "OK" }))
            .layer(middleware::from_fn_with_state(gate_state, access_gate))
    }

    pub async fn start(self) {
        let addr = SocketAddr::new(self.config.host.parse().expect("Invalid host"), self.config.port);
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind address");
        axum::serve(listener, self.router).await.expect("Failed to start server");
    }

    /// Seed the first admin account from env config. The bootstrap admin is
    /// created verified, there is nobody to read an OTP inbox yet.
    async fn create_first_admin_user(&self, user_repo: Arc<dyn crate::repository::user_repo::UserRepository>) {
        use tracing::{info, warn, error};
        use crate::util::password::{PasswordUtils, PasswordUtilsImpl};

        let admin_conf = match AdminUserConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Admin user config not loaded: {e}");
                return;
            }
        };

        match user_repo.find_by_email(&admin_conf.email).await {
            Ok(Some(_)) => {
                info!("Admin user already exists, skipping creation.");
                return;
            },
            Ok(None) => { /* continue to create */ },
            Err(e) => {
                error!("Failed to check for existing admin user: {e}");
                return;
            }
        }

        let password_hash = match PasswordUtilsImpl::hash_password(&admin_conf.password) {
            Ok(h) => h,
            Err(e) => {
                error!("Failed to hash admin password: {e}");
                return;
            }
        };

        let user = User {
            id: None,
            username: admin_conf.username.clone(),
            email: admin_conf.email.clone(),
            phone: None,
            password_hash,
            role: UserRole::Admin,
            is_verified: true,
            otp_code: None,
            otp_expires_at: None,
            created_at: None,
            updated_at: None,
        };
        match user_repo.insert(user).await {
            Ok(_) => info!("First admin user created."),
            Err(e) => error!("Failed to create admin user: {e}"),
        }
    }
}
