//! Short link entity representing a code-to-URL mapping.

use chrono::{DateTime, Utc};

/// Lifecycle state of a short link as observed at a point in time.
///
/// `Expired` is never stored: it is derived from `expires_at` on every read.
/// Soft-deleted rows are invisible to reads, so there is no `Deleted` state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Active,
    Expired,
}

/// A shortened URL with its visit counter and optional expiry.
#[derive(Debug, Clone)]
pub struct ShortLink {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub visit_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Creates a new ShortLink instance.
    pub fn new(
        id: i64,
        original_url: String,
        short_code: String,
        visit_count: i64,
        expires_at: Option<DateTime<Utc>>,
        created_by_ip: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_url,
            short_code,
            visit_count,
            expires_at,
            created_by_ip,
            created_at,
        }
    }

    /// Returns the state of the link at `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> LinkState {
        match self.expires_at {
            Some(expires_at) if expires_at <= now => LinkState::Expired,
            _ => LinkState::Active,
        }
    }

    /// Returns true if the link has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == LinkState::Expired
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for persisting a new short link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub original_url: String,
    pub short_code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by_ip: Option<String>,
}
