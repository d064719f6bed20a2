use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::repo_types::PasswordResetToken;
use crate::error::RepoError;

/// Opaque reset token: 32 random bytes, hex encoded.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn save(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetToken, RepoError>;

    async fn find_by_token(&self, token: &str) -> Result<PasswordResetToken, RepoError>;

    /// Atomically claims an unused, unexpired token by setting `used_at`.
    /// `None` when no such row exists; [`find_by_token`](Self::find_by_token) tells why.
    async fn consume(&self, token: &str) -> Result<Option<PasswordResetToken>, RepoError>;

    /// Marks every outstanding token of the user as used.
    async fn invalidate_for_user(&self, user_id: Uuid) -> Result<u64, RepoError>;

    /// Deletes used or expired rows.
    async fn cleanup_expired(&self) -> Result<u64, RepoError>;
}

#[derive(Clone)]
pub struct PgResetTokenStore {
    db: PgPool,
}

impl PgResetTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetTokenStore for PgResetTokenStore {
    #[instrument(skip(self, token))]
    async fn save(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetToken, RepoError> {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token, expires_at, used_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    #[instrument(skip_all)]
    async fn find_by_token(&self, token: &str) -> Result<PasswordResetToken, RepoError> {
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    #[instrument(skip_all)]
    async fn consume(&self, token: &str) -> Result<Option<PasswordResetToken>, RepoError> {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            UPDATE password_reset_tokens
            SET used_at = now()
            WHERE token = $1
              AND used_at IS NULL
              AND expires_at > now()
            RETURNING id, user_id, token, expires_at, used_at, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn invalidate_for_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let res = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = now()
            WHERE user_id = $1 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired(&self) -> Result<u64, RepoError> {
        let res = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE used_at IS NOT NULL
               OR expires_at < now()
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }
}

/// Periodically deletes used and expired reset tokens.
pub fn spawn_cleanup(store: Arc<dyn ResetTokenStore>, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.cleanup_expired().await {
                Ok(0) => {}
                Ok(n) => info!(deleted = n, "reset tokens cleaned"),
                Err(e) => warn!(error = %e, "reset token cleanup failed"),
            }
        }
    })
}
