//! In-process implementations of the repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entities::{NewShortLink, NewVisit, ShortLink, Visit};
use crate::domain::errors::StoreError;
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::utils::db_error::SHORT_CODE_UNIQUE_INDEX;

#[derive(Debug, Default)]
struct LinkTable {
    next_id: i64,
    /// Live rows keyed by short code.
    by_code: HashMap<String, ShortLink>,
}

/// In-memory short link store.
///
/// A single mutex guards the table so the uniqueness check and insert are
/// one step, matching the unique index of the SQL store. Deleted rows are
/// dropped outright.
#[derive(Debug, Default, Clone)]
pub struct MemoryShortLinkRepository {
    table: Arc<Mutex<LinkTable>>,
}

impl MemoryShortLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed record, bypassing uniqueness checks.
    ///
    /// Lets callers seed rows with arbitrary timestamps, e.g. already-expired links.
    pub async fn insert(&self, link: ShortLink) {
        let mut table = self.table.lock().await;
        table.next_id = table.next_id.max(link.id);
        table.by_code.insert(link.short_code.clone(), link);
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        self.table.lock().await.by_code.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ShortLinkRepository for MemoryShortLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError> {
        let mut table = self.table.lock().await;

        if table.by_code.contains_key(&new_link.short_code) {
            return Err(StoreError::UniqueViolation {
                constraint: SHORT_CODE_UNIQUE_INDEX.to_string(),
            });
        }

        table.next_id += 1;
        let link = ShortLink::new(
            table.next_id,
            new_link.original_url,
            new_link.short_code,
            0,
            new_link.expires_at,
            new_link.created_by_ip,
            Utc::now(),
        );
        table.by_code.insert(link.short_code.clone(), link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        Ok(self.table.lock().await.by_code.get(code).cloned())
    }

    async fn increment_visit_count(&self, id: i64) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        if let Some(link) = table.by_code.values_mut().find(|l| l.id == id) {
            link.visit_count += 1;
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut table = self.table.lock().await;
        let before = table.by_code.len();
        table
            .by_code
            .retain(|_, link| !link.expires_at.is_some_and(|e| e < now));
        Ok((before - table.by_code.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory visit store.
#[derive(Debug, Default, Clone)]
pub struct MemoryVisitRepository {
    visits: Arc<Mutex<Vec<Visit>>>,
}

impl MemoryVisitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded visits in insertion order.
    pub async fn all(&self) -> Vec<Visit> {
        self.visits.lock().await.clone()
    }
}

#[async_trait]
impl VisitRepository for MemoryVisitRepository {
    async fn create(&self, new_visit: NewVisit) -> Result<Visit, StoreError> {
        let mut visits = self.visits.lock().await;
        let visit = Visit::new(
            visits.len() as i64 + 1,
            new_visit.short_link_id,
            new_visit.client_ip,
            new_visit.user_agent,
            new_visit.referer,
            Utc::now(),
        );
        visits.push(visit.clone());
        Ok(visit)
    }

    async fn count_by_short_link(&self, short_link_id: i64) -> Result<i64, StoreError> {
        let visits = self.visits.lock().await;
        Ok(visits
            .iter()
            .filter(|v| v.short_link_id == short_link_id)
            .count() as i64)
    }
}
