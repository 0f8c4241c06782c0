//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::SharedResolutionService;
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::CacheService;

#[derive(Clone)]
pub struct AppState {
    pub resolution_service: Arc<SharedResolutionService>,
    /// Same cache the service uses; kept here for health reporting.
    pub cache: Arc<dyn CacheService>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` when resolving client IPs.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        resolution_service: Arc<SharedResolutionService>,
        cache: Arc<dyn CacheService>,
        visit_sender: mpsc::Sender<VisitEvent>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            resolution_service,
            cache,
            visit_sender,
            behind_proxy,
        }
    }
}
