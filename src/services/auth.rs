//! Verification of access tokens issued by the record store.
//!
//! Sign-in happens against the store; this service only checks the HS256
//! signature and expiry of the bearer token and reads the caller's identity.

use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::{UserRecord, UserRole};

/// Claims carried by store-issued access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User identifier.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
}

impl Claims {
    /// Application role; anything unknown (e.g. a store-level role such as
    /// `authenticated`) reads as a plain user.
    pub fn app_role(&self) -> UserRole {
        self.role
            .as_deref()
            .and_then(|role| role.parse().ok())
            .unwrap_or_default()
    }
}

/// Role the caller acts with.
///
/// The store's user row is authoritative, since role changes are written
/// there. The token claim only counts for callers with no row yet.
pub fn resolve_role(claims: &Claims, record: Option<&UserRecord>) -> UserRole {
    match record {
        Some(user) => user.effective_role(),
        None => claims.app_role(),
    }
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Unauthorized
        })
}
