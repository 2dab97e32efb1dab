use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

/// Revoked refresh-token identifiers. Entries are never removed here; once a
/// token's own expiry has passed its row only matters to housekeeping.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Returns `false` if the token was already blacklisted.
    async fn blacklist(&self, jti: Uuid, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<bool>;

    async fn is_blacklisted(&self, jti: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgTokenBlacklist {
    pool: PgPool,
}

impl PgTokenBlacklist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenBlacklist for PgTokenBlacklist {
    async fn blacklist(&self, jti: Uuid, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO token_blacklist (jti, user_id, expires_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_blacklisted(&self, jti: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::user_repository::{PgUserRepository, UserRepository};
    use chrono::Duration;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_blacklisting_twice_reports_conflict(pool: PgPool) {
        let user = PgUserRepository::new(pool.clone())
            .create("alice", "hash")
            .await
            .unwrap();
        let blacklist = PgTokenBlacklist::new(pool);
        let jti = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::days(1);

        assert!(!blacklist.is_blacklisted(jti).await.unwrap());
        assert!(blacklist.blacklist(jti, user.id, expires_at).await.unwrap());
        assert!(blacklist.is_blacklisted(jti).await.unwrap());
        assert!(!blacklist.blacklist(jti, user.id, expires_at).await.unwrap());

        assert!(!blacklist.is_blacklisted(Uuid::new_v4()).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_entries_are_removed_with_their_user(pool: PgPool) {
        let user = PgUserRepository::new(pool.clone())
            .create("alice", "hash")
            .await
            .unwrap();
        let blacklist = PgTokenBlacklist::new(pool.clone());
        let jti = Uuid::new_v4();
        blacklist
            .blacklist(jti, user.id, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(!blacklist.is_blacklisted(jti).await.unwrap());
    }
}
