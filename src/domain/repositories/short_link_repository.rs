//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::errors::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for short link records.
///
/// Soft-deleted rows are invisible to every method. Expired rows are still
/// returned by [`find_by_code`](Self::find_by_code): expiry is a read-time
/// decision made by the caller.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryShortLinkRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortLinkRepository: Send + Sync {
    /// Persists a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if a live record already holds the code.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError>;

    /// Finds the live record holding `code`, expired or not.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, StoreError>;

    /// Atomically increments the visit counter of the record with `id`.
    ///
    /// Must be a single store-level increment, never read-modify-write.
    async fn increment_visit_count(&self, id: i64) -> Result<(), StoreError>;

    /// Deletes every record whose expiry is set and strictly before `now`.
    ///
    /// Returns the number of records deleted.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Checks connectivity to the store.
    async fn ping(&self) -> Result<(), StoreError>;
}
