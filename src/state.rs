use anyhow::{Context, Result};
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::auth_service::AuthService;
use crate::task::task_service::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub task_service: TaskService,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub bcrypt_cost: u32,
    pub page_size: u32,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_minutes: parse_var("ACCESS_TOKEN_MINUTES", 15)?,
            refresh_token_days: parse_var("REFRESH_TOKEN_DAYS", 7)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            page_size: parse_var("PAGE_SIZE", 10)?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 3000)?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number", name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: u32 = parse_var("TASK_TRACKER_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        std::env::set_var("TASK_TRACKER_TEST_BAD_NUMBER", "ten");
        let result: Result<u32> = parse_var("TASK_TRACKER_TEST_BAD_NUMBER", 10);
        assert!(result.is_err());
    }
}
