//! Visit entity representing a single resolution of a short link.

use chrono::{DateTime, Utc};

/// An append-only visit record.
///
/// `short_link_id` is always the durable identifier of the visited
/// [`crate::domain::entities::ShortLink`], never its visit counter.
#[derive(Debug, Clone)]
pub struct Visit {
    pub id: i64,
    pub short_link_id: i64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Visit {
    /// Creates a new Visit instance.
    ///
    /// Client metadata is optional to handle missing headers.
    pub fn new(
        id: i64,
        short_link_id: i64,
        client_ip: Option<String>,
        user_agent: Option<String>,
        referer: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            short_link_id,
            client_ip,
            user_agent,
            referer,
            created_at,
        }
    }
}

/// Client metadata captured for a visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitMetadata {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Input data for appending a visit record.
///
/// The timestamp is set by the store.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub short_link_id: i64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl NewVisit {
    pub fn new(short_link_id: i64, metadata: VisitMetadata) -> Self {
        Self {
            short_link_id,
            client_ip: metadata.client_ip,
            user_agent: metadata.user_agent,
            referer: metadata.referer,
        }
    }
}
