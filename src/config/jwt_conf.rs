use std::env;
use tracing::{debug, error, info, warn};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable value: {0}")]
    InvalidEnvVar(String),
}

/// JWT configuration structure
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub jwt_secret: String,
    /// Bearer token expiration time in minutes
    pub token_expiration: i64,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JWT_SECRET: Secret key for signing JWT tokens (required)
    /// - JWT_TOKEN_EXPIRY: Token expiration in minutes (defaults to 43200 = 30 days)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from environment variables");

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| {
                error!("JWT_SECRET environment variable not found");
                ConfigError::MissingEnvVar("JWT_SECRET".to_string())
            })?;

        // Validate JWT secret length for security
        if jwt_secret.len() < 32 {
            error!("JWT_SECRET is too short (minimum 32 characters required)");
            return Err(ConfigError::InvalidEnvVar("JWT_SECRET must be at least 32 characters long".to_string()));
        }
        debug!("JWT secret loaded (length: {} chars)", jwt_secret.len());

        let token_expiration = env::var("JWT_TOKEN_EXPIRY")
            .unwrap_or_else(|_| {
                warn!("JWT_TOKEN_EXPIRY not set, using default: 43200 minutes (30 days)");
                "43200".to_string()
            })
            .parse::<i64>()
            .map_err(|e| {
                error!("Invalid JWT_TOKEN_EXPIRY value: {}", e);
                ConfigError::InvalidEnvVar(format!("JWT_TOKEN_EXPIRY: {}", e))
            })?;

        if token_expiration <= 0 {
            error!("JWT_TOKEN_EXPIRY must be greater than 0");
            return Err(ConfigError::InvalidEnvVar("JWT_TOKEN_EXPIRY must be greater than 0".to_string()));
        }
        debug!("JWT token expiration: {} minutes", token_expiration);

        let config = JwtConfig {
            jwt_secret,
            token_expiration,
        };

        info!("JWT configuration loaded successfully");
        Ok(config)
    }

    /// Validate the JWT configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        debug!("Validating JWT configuration");

        if self.jwt_secret.is_empty() {
            error!("JWT secret cannot be empty");
            return Err(ConfigError::InvalidEnvVar("JWT secret cannot be empty".to_string()));
        }

        if self.jwt_secret.len() < 32 {
            error!("JWT secret is too short (minimum 32 characters required)");
            return Err(ConfigError::InvalidEnvVar("JWT secret must be at least 32 characters long".to_string()));
        }

        if self.token_expiration <= 0 {
            error!("Token expiration must be greater than 0");
            return Err(ConfigError::InvalidEnvVar("Token expiration must be greater than 0".to_string()));
        }

        debug!("JWT configuration validation passed");
        Ok(())
    }

    /// Load JWT configuration from environment variables for testing
    /// Uses TEST_ prefixed environment variables
    pub fn from_test_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from test environment variables");

        let jwt_secret = env::var("TEST_JWT_SECRET")
            .map_err(|_| {
                error!("TEST_JWT_SECRET environment variable not found");
                ConfigError::MissingEnvVar("TEST_JWT_SECRET".to_string())
            })?;

        if jwt_secret.len() < 32 {
            error!("TEST_JWT_SECRET is too short (minimum 32 characters required)");
            return Err(ConfigError::InvalidEnvVar("TEST_JWT_SECRET must be at least 32 characters long".to_string()));
        }
        debug!("Test JWT secret loaded (length: {} chars)", jwt_secret.len());

        let token_expiration = env::var("TEST_JWT_TOKEN_EXPIRY")
            .unwrap_or_else(|_| {
                warn!("TEST_JWT_TOKEN_EXPIRY not set, using default: 15 minutes");
                "15".to_string()
            })
            .parse::<i64>()
            .map_err(|e| {
                error!("Invalid TEST_JWT_TOKEN_EXPIRY value: {}", e);
                ConfigError::InvalidEnvVar(format!("TEST_JWT_TOKEN_EXPIRY: {}", e))
            })?;
        debug!("Test JWT token expiration: {} minutes", token_expiration);

        let config = JwtConfig {
            jwt_secret,
            token_expiration,
        };

        info!("Test JWT configuration loaded successfully");
        Ok(config)
    }
}

/// Create JWT configuration for testing with default values
impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            jwt_secret: "test_secret_key_for_jwt_testing_should_be_long_enough_for_security_purposes".to_string(),
            token_expiration: 15,
        }
    }
}
