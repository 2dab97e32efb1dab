use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::auth::auth_dto::TokenPairResponse;
use crate::auth::auth_error::LogoutError;
use crate::auth::auth_repository::TokenBlacklist;
use crate::auth::jwt::{create_access_token, create_refresh_token, verify_jwt, Claims, TokenType};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, Result};
use crate::state::Config;
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";
const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    blacklist: Arc<dyn TokenBlacklist>,
    jwt_secret: String,
    bcrypt_cost: u32,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    /// Checked when the username is unknown so that path also runs bcrypt.
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        blacklist: Arc<dyn TokenBlacklist>,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            user_repo,
            blacklist,
            jwt_secret: config.jwt_secret.clone(),
            bcrypt_cost: config.bcrypt_cost,
            access_lifetime: Duration::minutes(config.access_token_minutes),
            refresh_lifetime: Duration::days(config.refresh_token_days),
            dummy_hash: hash_password(DUMMY_PASSWORD, config.bcrypt_cost)?.into(),
        })
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(User, TokenPairResponse)> {
        if self.user_repo.find_by_username(username).await?.is_some() {
            return Err(username_taken());
        }

        let password_hash = hash_password(password, self.bcrypt_cost)?;
        let user = self
            .user_repo
            .create(username, &password_hash)
            .await
            .map_err(|e| match e {
                AppError::Database(ref db_err)
                    if db_err
                        .as_database_error()
                        .map_or(false, |d| d.is_unique_violation()) =>
                {
                    username_taken()
                }
                other => other,
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        let tokens = self.issue_tokens(user.id)?;
        Ok((user, tokens))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPairResponse> {
        let Some(user) = self.user_repo.find_by_username(username).await? else {
            let _ = verify_password(password, &self.dummy_hash);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.into()));
        }

        self.issue_tokens(user.id)
    }

    /// Exchanges an active refresh token for a new access token. The refresh
    /// token itself is not rotated.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String> {
        let claims = verify_jwt(refresh_token, TokenType::Refresh, &self.jwt_secret)?;

        if self.blacklist.is_blacklisted(claims.token_id()?).await? {
            return Err(AppError::Unauthorized("Token is blacklisted".into()));
        }

        let user_id = claims.user_id()?;
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::Unauthorized("User not found".into()));
        }

        create_access_token(user_id, self.access_lifetime, &self.jwt_secret)
    }

    /// Blacklists a refresh token so it can no longer be exchanged.
    pub async fn logout(&self, refresh_token: Option<&str>) -> std::result::Result<(), LogoutError> {
        let token = refresh_token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(LogoutError::MissingToken)?;

        let claims = verify_jwt(token, TokenType::Refresh, &self.jwt_secret)
            .map_err(|_| LogoutError::InvalidToken)?;
        let (jti, user_id, expires_at) =
            revocation_fields(&claims).map_err(|_| LogoutError::InvalidToken)?;

        let inserted = self
            .blacklist
            .blacklist(jti, user_id, expires_at)
            .await
            .map_err(LogoutError::Store)?;

        if !inserted {
            return Err(LogoutError::InvalidToken);
        }

        tracing::info!(user_id = %user_id, token_id = %jti, "refresh token blacklisted");
        Ok(())
    }

    /// Resolves the caller behind a bearer access token.
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid> {
        verify_jwt(access_token, TokenType::Access, &self.jwt_secret)?.user_id()
    }

    fn issue_tokens(&self, user_id: Uuid) -> Result<TokenPairResponse> {
        Ok(TokenPairResponse {
            access: create_access_token(user_id, self.access_lifetime, &self.jwt_secret)?,
            refresh: create_refresh_token(user_id, self.refresh_lifetime, &self.jwt_secret)?,
        })
    }
}

fn revocation_fields(claims: &Claims) -> Result<(Uuid, Uuid, chrono::DateTime<chrono::Utc>)> {
    Ok((claims.token_id()?, claims.user_id()?, claims.expires_at()?))
}

fn username_taken() -> AppError {
    AppError::BadRequest("A user with that username already exists.".into())
}
