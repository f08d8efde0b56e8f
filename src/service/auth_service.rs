use tracing::{info, error, instrument};
use crate::repository::user_repo::UserRepository;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use crate::util::email::EmailService;
use crate::util::otp::OtpChallenge;
use crate::util::password::{PasswordUtilsImpl, PasswordUtils};
use crate::config::OtpConfig;
use std::sync::Arc;

use crate::model::user::{User, UserRole};
use crate::util::error::ServiceError;
use async_trait::async_trait;
use bson::oid::ObjectId;

/// Public projection of an account; never carries the password hash or
/// the outstanding OTP.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserView {
    pub id: Option<ObjectId>,
    #[serde(rename = "name")]
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Login answers with the account fields beside the token rather than
/// nested under a key, which is what storefront clients expect.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: UserView,
}

/// Acknowledges a pending registration; the token only arrives after
/// the OTP round-trip.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub email: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, username: String, email: String, password: String, phone: Option<String>) -> Result<RegisterResponse, ServiceError>;
    async fn verify_otp(&self, email: String, code: String) -> Result<AuthResponse, ServiceError>;
    async fn login(&self, email: String, password: String) -> Result<LoginResponse, ServiceError>;
}

pub struct AuthServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub email_service: Arc<dyn EmailService>,
    pub otp_config: OtpConfig,
}

impl AuthServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_utils: Arc<JwtTokenUtilsImpl>,
        email_service: Arc<dyn EmailService>,
        otp_config: OtpConfig,
    ) -> Self {
        Self { user_repo, jwt_utils, email_service, otp_config }
    }

    fn issue_token(&self, user: &User) -> Result<String, ServiceError> {
        self.jwt_utils.generate_token(
            &user.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            &user.email,
            user.role.as_str(),
        ).map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))
    }
}

/// Emails are compared and stored lowercased
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, password, phone), fields(username = %username, email = %email))]
    async fn register(&self, username: String, email: String, password: String, phone: Option<String>) -> Result<RegisterResponse, ServiceError> {
        info!("Registering new user");
        let email = normalize_email(&email);

        let existing = self.user_repo.find_by_email(&email).await;
        match &existing {
            Ok(Some(_)) => error!("Registration rejected, email already taken"),
            Ok(None) => info!("Email is free"),
            Err(e) => error!("Failed to check email availability: {e}"),
        }
        if existing?.is_some() {
            return Err(ServiceError::InvalidInput("User already exists".to_string()));
        }

        let hash = PasswordUtilsImpl::hash_password(&password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {}", e)))?;

        let challenge = OtpChallenge::generate(&self.otp_config)
            .map_err(|e| ServiceError::InternalError(format!("OTP error: {}", e)))?;

        let user = User {
            id: None,
            username,
            email: email.clone(),
            phone,
            password_hash: hash,
            role: UserRole::Customer,
            is_verified: false,
            otp_code: Some(challenge.code.clone()),
            otp_expires_at: Some(challenge.expires_at),
            created_at: None,
            updated_at: None,
        };

        let inserted = self.user_repo.insert(user).await;
        match &inserted {
            Ok(_) => info!("User inserted successfully"),
            Err(e) => error!("Failed to insert user: {e}"),
        }
        let inserted = inserted?;

        // The account stays on record even if this send fails; the admin can
        // clean up unverified accounts
        let expires_minutes = (self.otp_config.expiration_secs + 59) / 60;
        self.email_service
            .send_verification_email(&inserted.email, &inserted.username, &challenge.code, expires_minutes)
            .await
            .map_err(|e| {
                error!("Failed to send verification email: {e}");
                ServiceError::InternalError(format!("Failed to send verification email: {}", e))
            })?;

        info!("Verification code sent");
        let user_id = inserted.id.ok_or(ServiceError::InternalError("User record has no id".to_string()))?;
        Ok(RegisterResponse {
            user_id: user_id.to_hex(),
            email: inserted.email,
        })
    }

    #[instrument(skip(self, code), fields(email = %email))]
    async fn verify_otp(&self, email: String, code: String) -> Result<AuthResponse, ServiceError> {
        info!("Verifying OTP");
        let email = normalize_email(&email);

        let user_opt = self.user_repo.find_by_email(&email).await;
        match &user_opt {
            Ok(Some(_)) => info!("User found for verification"),
            Ok(None) => error!("User not found for verification"),
            Err(e) => error!("Failed to fetch user for verification: {e}"),
        }
        let mut user = user_opt?.ok_or(ServiceError::NotFound("User not found".to_string()))?;

        // A code verifies at most once. After success the record carries no
        // outstanding code, so a replay falls through to the same rejection
        // as a wrong or expired code.
        if user.is_verified {
            return Err(ServiceError::InvalidInput("Invalid or expired OTP".to_string()));
        }

        let (stored_code, expires_at) = match (user.otp_code.clone(), user.otp_expires_at) {
            (Some(c), Some(exp)) => (c, exp),
            // mismatch and expiry share one message, no probing oracle
            _ => return Err(ServiceError::InvalidInput("Invalid or expired OTP".to_string())),
        };

        let challenge = OtpChallenge::from_record(stored_code, expires_at);
        if challenge.verify(&code).is_err() {
            error!("OTP rejected for user");
            return Err(ServiceError::InvalidInput("Invalid or expired OTP".to_string()));
        }

        let user_id = user.id.ok_or(ServiceError::InternalError("User record has no id".to_string()))?;
        self.user_repo.mark_verified(user_id).await?;
        user.is_verified = true;
        user.otp_code = None;
        user.otp_expires_at = None;

        let token = self.issue_token(&user)?;
        info!("User verified successfully");
        Ok(AuthResponse { token, user: UserView::from(&user) })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: String, password: String) -> Result<LoginResponse, ServiceError> {
        info!("User login attempt");
        let email = normalize_email(&email);

        let user_opt = self.user_repo.find_by_email(&email).await;
        match &user_opt {
            Ok(Some(_)) => info!("User found for login"),
            Ok(None) => error!("User not found for login"),
            Err(e) => error!("Failed to fetch user for login: {e}"),
        }
        // unknown email and wrong password answer identically
        let user = user_opt?.ok_or(ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        let valid = PasswordUtilsImpl::verify_password(&password, &user.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verify error: {}", e)))?;
        if !valid {
            error!("Invalid credentials for user: {}", email);
            return Err(ServiceError::Unauthorized("Invalid email or password".to_string()));
        }

        if !user.is_verified {
            error!("Login rejected, account not verified: {}", email);
            return Err(ServiceError::Unauthorized("Please verify your email before logging in".to_string()));
        }

        let token = self.issue_token(&user)?;
        info!("User logged in successfully");
        Ok(LoginResponse { token, user: UserView::from(&user) })
    }
}
