//! PostgreSQL implementation of the short link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::errors::StoreError;
use crate::domain::repositories::ShortLinkRepository;
use crate::utils::db_error::map_sqlx_error;

#[derive(Debug, FromRow)]
struct ShortLinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    visit_count: i64,
    expires_at: Option<DateTime<Utc>>,
    created_by_ip: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(r: ShortLinkRow) -> Self {
        ShortLink::new(
            r.id,
            r.original_url,
            r.short_code,
            r.visit_count,
            r.expires_at,
            r.created_by_ip,
            r.created_at,
        )
    }
}

/// PostgreSQL repository for short link storage and retrieval.
///
/// Uses SQLx prepared statements; the partial unique index on live codes is
/// the final arbiter of uniqueness under concurrent creates.
pub struct PgShortLinkRepository {
    pool: Arc<PgPool>,
}

impl PgShortLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortLinkRepository for PgShortLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(
            r#"
            INSERT INTO short_links (original_url, short_code, expires_at, created_by_ip)
            VALUES ($1, $2, $3, $4)
            RETURNING id, original_url, short_code, visit_count, expires_at, created_by_ip, created_at
            "#,
        )
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .bind(new_link.expires_at)
        .bind(&new_link.created_by_ip)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(
            r#"
            SELECT id, original_url, short_code, visit_count, expires_at, created_by_ip, created_at
            FROM short_links
            WHERE short_code = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn increment_visit_count(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE short_links
            SET visit_count = visit_count + 1, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET deleted_at = $1, updated_at = $1
            WHERE expires_at IS NOT NULL
              AND expires_at < $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
