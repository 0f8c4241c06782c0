//! PostgreSQL implementation of the visit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewVisit, Visit};
use crate::domain::errors::StoreError;
use crate::domain::repositories::VisitRepository;
use crate::utils::db_error::map_sqlx_error;

#[derive(Debug, FromRow)]
struct VisitRow {
    id: i64,
    short_link_id: i64,
    client_ip: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    created_at: DateTime<Utc>,
}

/// PostgreSQL repository for append-only visit records.
pub struct PgVisitRepository {
    pool: Arc<PgPool>,
}

impl PgVisitRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn create(&self, new_visit: NewVisit) -> Result<Visit, StoreError> {
        let r = sqlx::query_as::<_, VisitRow>(
            r#"
            INSERT INTO short_link_visits (short_link_id, client_ip, user_agent, referer)
            VALUES ($1, $2, $3, $4)
            RETURNING id, short_link_id, client_ip, user_agent, referer, created_at
            "#,
        )
        .bind(new_visit.short_link_id)
        .bind(&new_visit.client_ip)
        .bind(&new_visit.user_agent)
        .bind(&new_visit.referer)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(Visit::new(
            r.id,
            r.short_link_id,
            r.client_ip,
            r.user_agent,
            r.referer,
            r.created_at,
        ))
    }

    async fn count_by_short_link(&self, short_link_id: i64) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM short_link_visits WHERE short_link_id = $1")
                .bind(short_link_id)
                .fetch_one(self.pool.as_ref())
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }
}
