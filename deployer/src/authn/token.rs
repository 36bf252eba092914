//! Bearer token issuing and verification
//!
//! Demo identity only: tokens map a caller to an opaque owner id so that
//! deployments can be scoped. No credential is checked against a user store.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Owner token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerClaims {
    /// Subject (owner ID)
    pub sub: String,

    pub email: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Signs and verifies owner tokens with a shared HS256 secret
pub struct TokenIssuer {
    secret: SecretString,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: SecretString, ttl_secs: u64) -> Self {
        Self {
            secret,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issue a token for `email`; the owner id is the normalized email
    pub fn issue(&self, email: &str) -> Result<(String, OwnerClaims), DeployError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(DeployError::ValidationError("Email is required".to_string()));
        }

        let now = Utc::now().timestamp();
        let claims = OwnerClaims {
            sub: email.clone(),
            email,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| DeployError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok((token, claims))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, raw: &str) -> Result<OwnerClaims, DeployError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<OwnerClaims>(
            raw,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map_err(|e| DeployError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(data.claims)
    }
}
