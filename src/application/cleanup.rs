//! Periodic sweep of expired short links.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::application::services::ResolutionService;
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};

/// Schedule for the cleanup runner.
#[derive(Debug, Clone, Copy)]
pub struct CleanupSchedule {
    /// Time between runs. The first run happens one full interval after start.
    pub interval: Duration,
    /// Upper bound on a single run.
    pub timeout: Duration,
}

/// Runs [`ResolutionService::cleanup_expired`] on a fixed schedule until
/// `shutdown` flips to `true` or its sender is dropped.
///
/// A failed or timed-out run is logged and retried on the next tick.
pub async fn run_cleanup<L, V>(
    service: Arc<ResolutionService<L, V>>,
    schedule: CleanupSchedule,
    mut shutdown: watch::Receiver<bool>,
) where
    L: ShortLinkRepository + ?Sized + 'static,
    V: VisitRepository + ?Sized + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + schedule.interval, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_secs = schedule.interval.as_secs(),
        "Cleanup runner started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_once(&service, schedule.timeout).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Cleanup runner stopped");
}

/// Performs a single time-boxed cleanup run. Returns the number of links removed.
pub async fn run_once<L, V>(service: &ResolutionService<L, V>, timeout: Duration) -> Option<u64>
where
    L: ShortLinkRepository + ?Sized + 'static,
    V: VisitRepository + ?Sized + 'static,
{
    match tokio::time::timeout(timeout, service.cleanup_expired()).await {
        Ok(Ok(deleted)) => Some(deleted),
        Ok(Err(e)) => {
            error!("Expired link cleanup failed: {}", e);
            None
        }
        Err(_) => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "Expired link cleanup timed out"
            );
            None
        }
    }
}
