#![allow(dead_code)]

use axum::extract::ConnectInfo;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

use shortlink::application::services::ResolutionService;
use shortlink::domain::entities::ShortLink;
use shortlink::domain::repositories::{ShortLinkRepository, VisitRepository};
use shortlink::domain::visit_event::VisitEvent;
use shortlink::infrastructure::cache::{CacheService, MemoryCache};
use shortlink::infrastructure::persistence::{MemoryShortLinkRepository, MemoryVisitRepository};
use shortlink::state::AppState;
use shortlink::utils::code_generator::CodeGenerator;

pub const BASE_URL: &str = "http://localhost:8000";

/// Handles to the in-memory collaborators behind a test [`AppState`].
pub struct TestContext {
    pub state: AppState,
    pub visits_rx: mpsc::Receiver<VisitEvent>,
    pub links: MemoryShortLinkRepository,
    pub visits: MemoryVisitRepository,
    pub cache: Arc<MemoryCache>,
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(100, false)
}

pub fn create_test_state_with(queue_capacity: usize, behind_proxy: bool) -> TestContext {
    let links = MemoryShortLinkRepository::new();
    let visits = MemoryVisitRepository::new();
    let cache = Arc::new(MemoryCache::new());
    let (tx, rx) = mpsc::channel(queue_capacity);

    let link_repo: Arc<dyn ShortLinkRepository> = Arc::new(links.clone());
    let visit_repo: Arc<dyn VisitRepository> = Arc::new(visits.clone());
    let shared_cache: Arc<dyn CacheService> = cache.clone();

    let service = ResolutionService::new(
        link_repo,
        visit_repo,
        shared_cache.clone(),
        CodeGenerator::default(),
        BASE_URL,
    );

    TestContext {
        state: AppState::new(Arc::new(service), shared_cache, tx, behind_proxy),
        visits_rx: rx,
        links,
        visits,
        cache,
    }
}

pub async fn seed_link(
    links: &MemoryShortLinkRepository,
    id: i64,
    code: &str,
    url: &str,
    expires_at: Option<DateTime<Utc>>,
) {
    links
        .insert(ShortLink::new(
            id,
            url.to_string(),
            code.to_string(),
            0,
            expires_at,
            None,
            Utc::now(),
        ))
        .await;
}

/// Polls `check` until it returns true or a second passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Injects a fixed peer address so handlers can extract `ConnectInfo`.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
