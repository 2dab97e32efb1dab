use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| invalid_token())
    }

    pub fn token_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.jti).map_err(|_| invalid_token())
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single().ok_or_else(invalid_token)
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Token is invalid or expired".to_string())
}

/// Signs a token of the given type for `user_id`, valid for `lifetime`.
/// Each token carries a fresh `jti` so it can be revoked on its own.
pub fn create_token(
    user_id: Uuid,
    token_type: TokenType,
    lifetime: Duration,
    secret: &str,
) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(lifetime)
        .ok_or(AppError::InternalError)?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        token_type,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to sign token: {:?}", e);
        AppError::InternalError
    })
}

/// Create access token (short-lived)
pub fn create_access_token(user_id: Uuid, lifetime: Duration, secret: &str) -> Result<String> {
    create_token(user_id, TokenType::Access, lifetime, secret)
}

/// Create refresh token (long-lived, revocable)
pub fn create_refresh_token(user_id: Uuid, lifetime: Duration, secret: &str) -> Result<String> {
    create_token(user_id, TokenType::Refresh, lifetime, secret)
}

/// Verify signature and expiry, and that the token is of the expected type.
pub fn verify_jwt(token: &str, expected: TokenType, secret: &str) -> Result<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| invalid_token())?;

    if claims.token_type != expected {
        return Err(invalid_token());
    }

    Ok(claims)
}
