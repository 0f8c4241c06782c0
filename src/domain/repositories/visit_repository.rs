//! Repository trait for visit records.

use crate::domain::entities::{NewVisit, Visit};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Repository interface for append-only visit records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVisitRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryVisitRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Appends a visit record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the referenced short link does not exist
    /// or the store is unreachable.
    async fn create(&self, new_visit: NewVisit) -> Result<Visit, StoreError>;

    /// Counts visit records for a short link.
    async fn count_by_short_link(&self, short_link_id: i64) -> Result<i64, StoreError>;
}
