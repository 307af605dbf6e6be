use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AuthError;
use crate::registry::SessionRegistry;

/// Postgres-backed session registry.
///
/// One row per live session in `valid_jwt`; the primary key on `jti` means
/// a concurrent race on the same identifier resolves at the DELETE: only one
/// statement reports an affected row, and the loser never inserts a
/// replacement session.
#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    /// Connect and ensure the schema exists. Any failure here means the
    /// process must not come up.
    pub async fn connect(database_url: &str) -> Result<Self, AuthError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(AuthError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS valid_jwt (
                jti UUID PRIMARY KEY,
                guid UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&pool)
        .await
        .map_err(AuthError::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS valid_jwt_guid ON valid_jwt (guid)")
            .execute(&pool)
            .await
            .map_err(AuthError::storage)?;

        info!("session registry ready");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SessionRegistry for PgRegistry {
    async fn create(&self, guid: Uuid) -> Result<Uuid, AuthError> {
        let jti = Uuid::new_v4();
        sqlx::query("INSERT INTO valid_jwt (jti, guid) VALUES ($1, $2)")
            .bind(jti)
            .bind(guid)
            .execute(&self.pool)
            .await
            .map_err(AuthError::storage)?;
        Ok(jti)
    }

    async fn lookup(&self, jti: Uuid) -> Result<Option<Uuid>, AuthError> {
        sqlx::query_scalar::<_, Uuid>("SELECT guid FROM valid_jwt WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await
            .map_err(AuthError::storage)
    }

    async fn delete(&self, jti: Uuid) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM valid_jwt WHERE jti = $1")
            .bind(jti)
            .execute(&self.pool)
            .await
            .map_err(AuthError::storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, guid: Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM valid_jwt WHERE guid = $1")
            .bind(guid)
            .execute(&self.pool)
            .await
            .map_err(AuthError::storage)?;
        let removed = result.rows_affected();
        debug!(%guid, removed, "purged sessions for identity");
        Ok(removed)
    }
}
