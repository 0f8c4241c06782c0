//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum server lifecycle.

use crate::application::cache_policy::CachePolicy;
use crate::application::cleanup::{CleanupSchedule, run_cleanup};
use crate::application::services::{ResolutionService, SharedResolutionService};
use crate::application::visit_worker::run_visit_worker;
use crate::config::{CacheBackend, Config};
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::infrastructure::cache::{CacheService, MemoryCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgShortLinkRepository, PgVisitRepository};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::CodeGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Upper bound on draining queued visit events after the listener stops.
const VISIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How often the in-process cache drops entries whose TTL has elapsed.
const MEMORY_CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Opens the PostgreSQL pool sized from configuration.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Builds the cache tier selected by `CACHE_BACKEND`.
///
/// An unreachable Redis degrades to [`NullCache`] rather than aborting startup.
/// The in-process backend gets a purge task that stops with `shutdown`.
pub async fn build_cache(
    config: &Config,
    shutdown: &watch::Receiver<bool>,
) -> Arc<dyn CacheService> {
    match (config.cache_backend, &config.redis_url) {
        (CacheBackend::Redis, Some(redis_url)) => match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        },
        (CacheBackend::Memory, _) => {
            tracing::info!("Cache enabled (in-process)");
            let cache = Arc::new(MemoryCache::new());
            tokio::spawn(
                Arc::clone(&cache).run_purge(MEMORY_CACHE_PURGE_INTERVAL, shutdown.clone()),
            );
            cache
        }
        _ => {
            tracing::info!("Cache disabled (NullCache)");
            Arc::new(NullCache::new())
        }
    }
}

/// Wires the resolution service over PostgreSQL repositories.
pub fn build_service(
    pool: PgPool,
    cache: Arc<dyn CacheService>,
    config: &Config,
) -> Arc<SharedResolutionService> {
    let pool = Arc::new(pool);
    let links: Arc<dyn ShortLinkRepository> = Arc::new(PgShortLinkRepository::new(pool.clone()));
    let visits: Arc<dyn VisitRepository> = Arc::new(PgVisitRepository::new(pool));

    let service = ResolutionService::new(
        links,
        visits,
        cache,
        CodeGenerator::new(config.url_length),
        config.short_url_domain.clone(),
    )
    .with_cache_policy(CachePolicy::new(config.cache_ttl()))
    .with_background_timeout(config.background_timeout());

    Arc::new(service)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Cache tier (Redis, in-process, or disabled)
/// - Background visit worker and cleanup runner
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cache = build_cache(&config, &shutdown_rx).await;
    let service = build_service(pool, cache.clone(), &config);

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    let visit_worker = tokio::spawn(run_visit_worker(
        visit_rx,
        service.clone(),
        config.visit_worker_concurrency,
    ));

    let cleanup = tokio::spawn(run_cleanup(
        service.clone(),
        CleanupSchedule {
            interval: config.cleanup_interval(),
            timeout: config.cleanup_timeout(),
        },
        shutdown_rx,
    ));

    let state = AppState::new(service, cache, visit_tx, config.behind_proxy);
    let app = app_router(state, config.request_timeout());

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, shutting down background tasks");

    let _ = shutdown_tx.send(true);
    if let Err(e) = cleanup.await {
        tracing::warn!("Cleanup runner ended abnormally: {}", e);
    }

    // The router (and every visit sender it held) is gone, so the worker
    // exits once the queue is empty.
    match tokio::time::timeout(VISIT_DRAIN_TIMEOUT, visit_worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Visit worker ended abnormally: {}", e),
        Err(_) => tracing::warn!("Timed out draining visit queue"),
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
