use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::config::OtpConfig;

/// OTP utility errors
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Code has expired")]
    CodeExpired,

    #[error("Code does not match")]
    CodeMismatch,
}

/// A pending e-mail verification challenge. The code and its expiry are
/// persisted on the user record; a user has at most one outstanding
/// challenge and issuing a new one replaces it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OtpChallenge {
    pub code: String,
    pub created_at: i64, // Unix timestamp
    pub expires_at: i64, // Unix timestamp
}

impl OtpChallenge {
    /// Generate a fresh numeric challenge per the configured length and TTL
    pub fn generate(config: &OtpConfig) -> Result<Self, OtpError> {
        config
            .validate()
            .map_err(|e| OtpError::ConfigError(e.to_string()))?;

        let mut rng = rand::thread_rng();
        let code: String = (0..config.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();

        let now = chrono::Utc::now().timestamp();
        debug!("Generated OTP challenge of {} digits", code.len());
        Ok(OtpChallenge {
            code,
            created_at: now,
            expires_at: now + config.expiration_secs,
        })
    }

    /// Rebuild a challenge from the fields stored on a user record
    pub fn from_record(code: String, expires_at: i64) -> Self {
        OtpChallenge {
            code,
            created_at: 0,
            expires_at,
        }
    }

    /// A code is usable strictly before its expiry instant
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }

    /// Check a submitted code against this challenge
    pub fn verify(&self, candidate: &str) -> Result<(), OtpError> {
        if self.is_expired() {
            return Err(OtpError::CodeExpired);
        }
        if self.code != candidate.trim() {
            return Err(OtpError::CodeMismatch);
        }
        Ok(())
    }
}
