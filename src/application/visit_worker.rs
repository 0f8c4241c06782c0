//! Background consumer that turns queued visit events into visit records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::application::services::ResolutionService;
use crate::domain::errors::{ShortLinkError, StoreError};
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::domain::visit_event::VisitEvent;

const RETRY_BASE_MILLIS: u64 = 50;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRIES: usize = 3;

/// Consumes visit events until every sender is dropped.
///
/// At most `concurrency` events are recorded at once. In-flight recordings
/// are awaited before returning, so dropping the sender and awaiting this
/// future drains the queue.
pub async fn run_visit_worker<L, V>(
    mut rx: mpsc::Receiver<VisitEvent>,
    service: Arc<ResolutionService<L, V>>,
    concurrency: usize,
) where
    L: ShortLinkRepository + ?Sized + 'static,
    V: VisitRepository + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    info!(concurrency, "Visit worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let service = Arc::clone(&service);

        in_flight.spawn(async move {
            record_with_retry(&service, event).await;
            drop(permit);
        });

        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}

    info!("Visit worker stopped");
}

async fn record_with_retry<L, V>(service: &ResolutionService<L, V>, event: VisitEvent)
where
    L: ShortLinkRepository + ?Sized + 'static,
    V: VisitRepository + ?Sized + 'static,
{
    let (code, metadata) = event.into_parts();

    let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MILLIS)
        .max_delay(RETRY_MAX_DELAY)
        .map(jitter)
        .take(MAX_RETRIES);

    let code_ref = code.as_str();
    let metadata_ref = &metadata;

    let result = RetryIf::start(
        strategy,
        move || service.record_visit_for_code(code_ref, metadata_ref.clone()),
        is_transient,
    )
    .await;

    match result {
        Ok(visit) => debug!(short_link_id = visit.short_link_id, "Visit recorded for {}", code),
        Err(ShortLinkError::NotFound { .. }) => {
            warn!("Dropping visit for {}: link no longer exists", code)
        }
        Err(e) => error!("Failed to record visit for {}: {}", code, e),
    }
}

/// Connection and pool failures are worth retrying. Errors reported by the
/// database itself (constraint violations, oversized values) are permanent.
fn is_transient(err: &ShortLinkError) -> bool {
    match err {
        ShortLinkError::Store(StoreError::Database(e)) => matches!(
            e,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
        ),
        ShortLinkError::Store(StoreError::Unavailable(_)) => true,
        _ => false,
    }
}
