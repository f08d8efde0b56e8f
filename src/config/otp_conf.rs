use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Configuration for e-mail OTP verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Number of digits in a generated code
    pub code_length: usize,
    /// Code expiration time in seconds
    pub expiration_secs: i64,
}

impl OtpConfig {
    /// Create OtpConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading OTP configuration from environment variables");

        let code_length = env::var("OTP_CODE_LENGTH")
            .unwrap_or_else(|_| {
                warn!("OTP_CODE_LENGTH not set, defaulting to 6 digits");
                "6".to_string()
            })
            .parse::<usize>()
            .map_err(|_| {
                error!("Invalid OTP_CODE_LENGTH value");
                ConfigError::InvalidValue("Invalid OTP_CODE_LENGTH value".to_string())
            })?;
        debug!("OTP code length: {} digits", code_length);

        let expiration_secs = env::var("OTP_EXPIRATION")
            .unwrap_or_else(|_| {
                warn!("OTP_EXPIRATION not set, defaulting to 600 seconds (10 minutes)");
                "600".to_string()
            })
            .parse::<i64>()
            .map_err(|_| {
                error!("Invalid OTP_EXPIRATION value");
                ConfigError::InvalidValue("Invalid OTP_EXPIRATION value".to_string())
            })?;
        debug!("OTP expiration: {} seconds", expiration_secs);

        let config = OtpConfig {
            code_length,
            expiration_secs,
        };

        config.validate()?;
        info!("OTP configuration loaded successfully");
        Ok(config)
    }

    /// Create OtpConfig for testing
    pub fn from_test_env() -> Self {
        OtpConfig {
            code_length: 6,
            expiration_secs: 120,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating OTP configuration");

        if self.code_length < 4 {
            error!("OTP code length is too short");
            return Err(ConfigError::ValidationError("OTP code length must be at least 4 digits".to_string()));
        }

        if self.code_length > 10 {
            error!("OTP code length is too long");
            return Err(ConfigError::ValidationError("OTP code length must be at most 10 digits".to_string()));
        }

        if self.expiration_secs <= 0 {
            error!("OTP expiration is not positive");
            return Err(ConfigError::ValidationError("OTP expiration must be greater than 0".to_string()));
        }

        info!("OTP configuration validation successful");
        Ok(())
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        OtpConfig {
            code_length: 6,
            expiration_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OtpConfig::default();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.expiration_secs, 600);
    }

    #[test]
    fn test_test_config() {
        let config = OtpConfig::from_test_env();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.expiration_secs, 120);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = OtpConfig::from_test_env();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_short_code() {
        let mut config = OtpConfig::from_test_env();
        config.code_length = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_long_code() {
        let mut config = OtpConfig::from_test_env();
        config.code_length = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_expiration() {
        let mut config = OtpConfig::from_test_env();
        config.expiration_secs = 0;
        assert!(config.validate().is_err());
    }
}
