//! Durable session store backed by the `sessions` table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use rxconsole_auth::SessionId;
use rxconsole_core::UserId;

use super::SessionStore;
use crate::repository::{postgres::map_sqlx_error, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        sid         TEXT PRIMARY KEY,
        user_id     BIGINT NOT NULL,
        expires_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS sessions_expires_at_idx ON sessions (expires_at)",
];

/// Sessions survive process restarts. Expiry is evaluated in SQL against the
/// database clock at read time.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: Arc<PgPool>,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_session_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    #[instrument(skip(self, sid), fields(user_id = %user_id), err)]
    async fn put(&self, sid: &SessionId, user_id: UserId, ttl: Duration) -> Result<(), StoreError> {
        let expires_at: DateTime<Utc> = Utc::now() + ttl;
        sqlx::query(
            r#"
            INSERT INTO sessions (sid, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (sid)
            DO UPDATE SET user_id = EXCLUDED.user_id, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(sid.as_str())
        .bind(user_id.get())
        .bind(expires_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("put_session", e))?;
        Ok(())
    }

    #[instrument(skip(self, sid), err)]
    async fn get(&self, sid: &SessionId) -> Result<Option<UserId>, StoreError> {
        let row = sqlx::query("SELECT user_id FROM sessions WHERE sid = $1 AND expires_at > NOW()")
            .bind(sid.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_session", e))?;
        row.map(|r| r.try_get::<i64, _>("user_id").map(UserId::new))
            .transpose()
            .map_err(|e| map_sqlx_error("get_session", e))
    }

    #[instrument(skip(self, sid), err)]
    async fn delete(&self, sid: &SessionId) -> Result<Option<UserId>, StoreError> {
        let row = sqlx::query(
            "DELETE FROM sessions WHERE sid = $1 RETURNING user_id, expires_at > NOW() AS live",
        )
        .bind(sid.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_session", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let live: bool = row.try_get("live").map_err(|e| map_sqlx_error("delete_session", e))?;
        if !live {
            return Ok(None);
        }
        let user_id: i64 = row.try_get("user_id").map_err(|e| map_sqlx_error("delete_session", e))?;
        Ok(Some(UserId::new(user_id)))
    }

    #[instrument(skip(self), err)]
    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("purge_sessions", e))?;
        Ok(result.rows_affected())
    }
}
