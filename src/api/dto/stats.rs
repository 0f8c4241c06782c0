//! DTOs for the link statistics endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::LinkStats;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub short_url: String,
    pub original_url: String,
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<LinkStats> for StatsResponse {
    fn from(stats: LinkStats) -> Self {
        Self {
            short_url: stats.short_url,
            original_url: stats.original_url,
            visit_count: stats.visit_count,
            created_at: stats.created_at,
            expires_at: stats.expires_at,
        }
    }
}
