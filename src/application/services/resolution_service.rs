//! Short code allocation and cache-aside resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::application::cache_policy::{CachePolicy, CachedTarget};
use crate::domain::entities::{NewShortLink, NewVisit, ShortLink, Visit, VisitMetadata};
use crate::domain::errors::ShortLinkError;
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{CodeGenerator, is_valid_custom_code};

/// Number of generated candidates tried before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Time box for fire-and-forget work spawned by a resolution.
pub const DEFAULT_BACKGROUND_TIMEOUT: Duration = Duration::from_secs(5);

/// Input for [`ResolutionService::create_short_link`].
///
/// `original_url` is expected to be validated by the caller.
#[derive(Debug, Clone, Default)]
pub struct CreateShortLink {
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub custom_code: Option<String>,
    pub creator_ip: Option<String>,
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct CreatedShortLink {
    pub short_url: String,
    pub original_url: String,
    pub short_code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Authoritative statistics for a short link.
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub short_url: String,
    pub original_url: String,
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Orchestrates code allocation, the two-tier lookup and expiry reconciliation.
///
/// The store is the source of truth; every cache operation is an optimization
/// whose failures are logged and swallowed. No cross-request locks are held:
/// uniqueness checks here are advisory and the store's unique index decides
/// races.
///
/// Callers impose deadlines by dropping the returned futures (for example
/// via a request timeout). Work spawned by [`resolve`](Self::resolve) runs on
/// its own task, bounded only by the background timeout, so cancelling the
/// request does not abort it.
pub struct ResolutionService<L, V>
where
    L: ShortLinkRepository + ?Sized,
    V: VisitRepository + ?Sized,
{
    links: Arc<L>,
    visits: Arc<V>,
    cache: Arc<dyn CacheService>,
    generator: CodeGenerator,
    policy: CachePolicy,
    base_url: String,
    background_timeout: Duration,
}

impl<L, V> ResolutionService<L, V>
where
    L: ShortLinkRepository + ?Sized + 'static,
    V: VisitRepository + ?Sized + 'static,
{
    /// Creates a new resolution service with the default cache policy.
    ///
    /// `base_url` is the scheme and host that short codes are appended to.
    pub fn new(
        links: Arc<L>,
        visits: Arc<V>,
        cache: Arc<dyn CacheService>,
        generator: CodeGenerator,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            links,
            visits,
            cache,
            generator,
            policy: CachePolicy::default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            background_timeout: DEFAULT_BACKGROUND_TIMEOUT,
        }
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_background_timeout(mut self, timeout: Duration) -> Self {
        self.background_timeout = timeout;
        self
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.policy
    }

    /// Constructs the full short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Creates a short link, either with a custom code or a generated one.
    ///
    /// # Errors
    ///
    /// - [`ShortLinkError::InvalidCode`] if the custom code fails format rules
    /// - [`ShortLinkError::CodeInUse`] if a live record holds the code, or the
    ///   store rejects the insert on its unique index
    /// - [`ShortLinkError::AllocationExhausted`] if every generated candidate collided
    /// - [`ShortLinkError::Store`] / [`ShortLinkError::Generator`] on collaborator failure
    pub async fn create_short_link(
        &self,
        request: CreateShortLink,
    ) -> Result<CreatedShortLink, ShortLinkError> {
        let now = Utc::now();

        let short_code = match request.custom_code {
            Some(custom) => self.claim_custom_code(custom, now).await?,
            None => self.generate_unique_code(now).await?,
        };

        let new_link = NewShortLink {
            original_url: request.original_url,
            short_code: short_code.clone(),
            expires_at: request.expires_at,
            created_by_ip: request.creator_ip,
        };

        let link = self.links.create(new_link).await.map_err(|e| {
            if e.is_unique_violation() {
                ShortLinkError::CodeInUse {
                    code: short_code.clone(),
                }
            } else {
                ShortLinkError::Store(e)
            }
        })?;

        metrics::counter!("shortlink_links_created_total").increment(1);
        info!(short_code = %link.short_code, id = link.id, "Short link created");

        populate_cache(self.cache.as_ref(), self.policy, &link).await;

        Ok(CreatedShortLink {
            short_url: self.short_url(&link.short_code),
            original_url: link.original_url,
            short_code: link.short_code,
            expires_at: link.expires_at,
            created_at: link.created_at,
        })
    }

    /// Resolves a short code to its original URL, cache first.
    ///
    /// A cache hit returns immediately. On a miss the store is consulted and,
    /// if the record is live, a background task increments its visit counter
    /// and repopulates the cache.
    ///
    /// # Errors
    ///
    /// - [`ShortLinkError::NotFound`] if the code is absent or expired
    /// - [`ShortLinkError::Store`] if the store lookup fails
    pub async fn resolve(&self, code: &str) -> Result<String, ShortLinkError> {
        let now = Utc::now();

        match self.cache.get(code).await {
            Ok(Some(raw)) => match CachedTarget::decode(&raw) {
                Some(target) if !target.is_expired_at(now) => {
                    metrics::counter!("shortlink_cache_hits_total").increment(1);
                    debug!("Cache HIT: {}", code);
                    return Ok(target.original_url);
                }
                Some(_) => {
                    debug!("Cache entry for {} outlived its link", code);
                    if let Err(e) = self.cache.invalidate(code).await {
                        warn!("Failed to invalidate stale cache entry {}: {}", code, e);
                    }
                    return Err(ShortLinkError::not_found(code));
                }
                None => {
                    warn!("Ignoring undecodable cache entry for {}", code);
                }
            },
            Ok(None) => {
                metrics::counter!("shortlink_cache_misses_total").increment(1);
                debug!("Cache MISS: {}", code);
            }
            Err(e) => {
                warn!("Cache lookup failed for {}, falling back to store: {}", code, e);
            }
        }

        let link = self.find_live(code, now).await?;
        let original_url = link.original_url.clone();
        self.spawn_miss_followup(link);

        Ok(original_url)
    }

    /// Appends a visit record for the short link with durable id `short_link_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ShortLinkError::Store`] if the store rejects the write.
    pub async fn record_visit(
        &self,
        short_link_id: i64,
        metadata: VisitMetadata,
    ) -> Result<Visit, ShortLinkError> {
        let visit = self
            .visits
            .create(NewVisit::new(short_link_id, metadata))
            .await?;

        Ok(visit)
    }

    /// Looks up the live record for `code` and appends a visit against its id.
    ///
    /// # Errors
    ///
    /// - [`ShortLinkError::NotFound`] if no live record holds the code
    /// - [`ShortLinkError::Store`] on store failure
    pub async fn record_visit_for_code(
        &self,
        code: &str,
        metadata: VisitMetadata,
    ) -> Result<Visit, ShortLinkError> {
        let link = self
            .links
            .find_by_code(code)
            .await?
            .ok_or_else(|| ShortLinkError::not_found(code))?;

        self.record_visit(link.id, metadata).await
    }

    /// Returns authoritative statistics for a code, bypassing the cache.
    ///
    /// # Errors
    ///
    /// - [`ShortLinkError::NotFound`] if the code is absent or expired
    /// - [`ShortLinkError::Store`] on store failure
    pub async fn get_stats(&self, code: &str) -> Result<LinkStats, ShortLinkError> {
        let link = self.find_live(code, Utc::now()).await?;

        Ok(LinkStats {
            short_url: self.short_url(&link.short_code),
            original_url: link.original_url,
            visit_count: link.visit_count,
            created_at: link.created_at,
            expires_at: link.expires_at,
        })
    }

    /// Deletes every link whose expiry is set and strictly before now.
    ///
    /// Cached entries are left to lapse on their own TTL, which never
    /// exceeds the link's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`ShortLinkError::Store`] on store failure.
    pub async fn cleanup_expired(&self) -> Result<u64, ShortLinkError> {
        let now = Utc::now();
        let deleted = self.links.delete_expired(now).await?;

        metrics::counter!("shortlink_expired_links_deleted_total").increment(deleted);
        info!("Cleaned up {} expired short links", deleted);

        Ok(deleted)
    }

    /// Checks connectivity to the durable store.
    pub async fn check_store(&self) -> Result<(), ShortLinkError> {
        self.links.ping().await?;
        Ok(())
    }

    async fn find_live(&self, code: &str, now: DateTime<Utc>) -> Result<ShortLink, ShortLinkError> {
        self.links
            .find_by_code(code)
            .await?
            .filter(|link| !link.is_expired_at(now))
            .ok_or_else(|| ShortLinkError::not_found(code))
    }

    /// Returns true if a live, unexpired record holds `code`.
    async fn is_taken(&self, code: &str, now: DateTime<Utc>) -> Result<bool, ShortLinkError> {
        Ok(self
            .links
            .find_by_code(code)
            .await?
            .is_some_and(|link| !link.is_expired_at(now)))
    }

    async fn claim_custom_code(
        &self,
        code: String,
        now: DateTime<Utc>,
    ) -> Result<String, ShortLinkError> {
        if !is_valid_custom_code(&code) {
            return Err(ShortLinkError::InvalidCode { code });
        }

        if self.is_taken(&code, now).await? {
            return Err(ShortLinkError::CodeInUse { code });
        }

        Ok(code)
    }

    async fn generate_unique_code(&self, now: DateTime<Utc>) -> Result<String, ShortLinkError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.generator.generate()?;

            if !self.is_taken(&candidate, now).await? {
                return Ok(candidate);
            }

            debug!(attempt, "Generated code {} collided", candidate);
        }

        Err(ShortLinkError::AllocationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    /// Increments the visit counter and repopulates the cache on a detached task.
    fn spawn_miss_followup(&self, link: ShortLink) {
        let links = Arc::clone(&self.links);
        let cache = Arc::clone(&self.cache);
        let policy = self.policy;
        let timeout = self.background_timeout;

        tokio::spawn(async move {
            let increment = async {
                if let Err(e) = links.increment_visit_count(link.id).await {
                    warn!(
                        "Failed to increment visit count for {}: {}",
                        link.short_code, e
                    );
                }
            };
            let repopulate = populate_cache(cache.as_ref(), policy, &link);

            if tokio::time::timeout(timeout, async {
                tokio::join!(increment, repopulate);
            })
            .await
            .is_err()
            {
                warn!("Background work for {} timed out", link.short_code);
            }
        });
    }
}

/// Best-effort cache write for a link; skipped if the link must not be cached.
async fn populate_cache(cache: &dyn CacheService, policy: CachePolicy, link: &ShortLink) {
    let Some(ttl) = policy.ttl_for(link.expires_at, Utc::now()) else {
        debug!("Not caching {}: already expired", link.short_code);
        return;
    };

    let value = CachedTarget::from(link).encode();
    if let Err(e) = cache.set_with_ttl(&link.short_code, &value, ttl).await {
        warn!("Failed to cache {}: {}", link.short_code, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache_policy::DEFAULT_CACHE_TTL;
    use crate::domain::errors::StoreError;
    use crate::domain::repositories::{MockShortLinkRepository, MockVisitRepository};
    use crate::infrastructure::cache::{CacheError, MockCacheService};
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    const BASE_URL: &str = "https://sho.rt/";

    fn create_test_link(id: i64, code: &str, expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink::new(
            id,
            format!("https://example.com/{code}"),
            code.to_string(),
            3,
            expires_at,
            None,
            Utc::now(),
        )
    }

    fn link_from_new(new_link: NewShortLink) -> ShortLink {
        ShortLink::new(
            10,
            new_link.original_url,
            new_link.short_code,
            0,
            new_link.expires_at,
            new_link.created_by_ip,
            Utc::now(),
        )
    }

    fn service(
        links: MockShortLinkRepository,
        visits: MockVisitRepository,
        cache: MockCacheService,
    ) -> ResolutionService<MockShortLinkRepository, MockVisitRepository> {
        ResolutionService::new(
            Arc::new(links),
            Arc::new(visits),
            Arc::new(cache),
            CodeGenerator::default(),
            BASE_URL,
        )
    }

    fn request(custom_code: Option<&str>) -> CreateShortLink {
        CreateShortLink {
            original_url: "https://example.com/long".to_string(),
            expires_at: None,
            custom_code: custom_code.map(str::to_string),
            creator_ip: Some("127.0.0.1".to_string()),
        }
    }

    async fn signalled(rx: &mut mpsc::UnboundedReceiver<()>) {
        tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .expect("background work did not run")
            .expect("signal channel closed");
    }

    #[tokio::test]
    async fn test_create_generated_code_first_attempt() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        links
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));
        links
            .expect_create()
            .withf(|new_link| {
                new_link.short_code.len() == 6
                    && new_link.created_by_ip.as_deref() == Some("127.0.0.1")
            })
            .times(1)
            .returning(|new_link| Ok(link_from_new(new_link)));
        cache
            .expect_set_with_ttl()
            .withf(|_, value, ttl| value == "-\thttps://example.com/long" && *ttl == DEFAULT_CACHE_TTL)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        let created = service.create_short_link(request(None)).await.unwrap();

        assert_eq!(created.short_code.len(), 6);
        assert_eq!(created.short_url, format!("https://sho.rt/{}", created.short_code));
        assert_eq!(created.original_url, "https://example.com/long");
        assert!(created.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_create_retries_after_collision() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();
        let lookups = Arc::new(AtomicUsize::new(0));

        let counter = lookups.clone();
        links.expect_find_by_code().returning(move |code| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Some(create_test_link(1, code, None)))
            } else {
                Ok(None)
            }
        });
        links
            .expect_create()
            .times(1)
            .returning(|new_link| Ok(link_from_new(new_link)));
        cache.expect_set_with_ttl().returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        assert!(service.create_short_link(request(None)).await.is_ok());
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_create_allocation_exhausted_after_five_collisions() {
        let mut links = MockShortLinkRepository::new();

        links
            .expect_find_by_code()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|code| Ok(Some(create_test_link(1, code, None))));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let err = service.create_short_link(request(None)).await.unwrap_err();

        assert!(matches!(
            err,
            ShortLinkError::AllocationExhausted { attempts: 5 }
        ));
    }

    #[tokio::test]
    async fn test_create_expired_holder_does_not_block_generated_code() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        links.expect_find_by_code().times(1).returning(|code| {
            Ok(Some(create_test_link(
                1,
                code,
                Some(Utc::now() - ChronoDuration::hours(1)),
            )))
        });
        links
            .expect_create()
            .times(1)
            .returning(|new_link| Ok(link_from_new(new_link)));
        cache.expect_set_with_ttl().returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        assert!(service.create_short_link(request(None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_with_custom_code() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        links
            .expect_find_by_code()
            .withf(|code| code == "Promo2025")
            .times(1)
            .returning(|_| Ok(None));
        links
            .expect_create()
            .withf(|new_link| new_link.short_code == "Promo2025")
            .times(1)
            .returning(|new_link| Ok(link_from_new(new_link)));
        cache
            .expect_set_with_ttl()
            .withf(|key, _, _| key == "Promo2025")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        let created = service
            .create_short_link(request(Some("Promo2025")))
            .await
            .unwrap();

        assert_eq!(created.short_code, "Promo2025");
        assert_eq!(created.short_url, "https://sho.rt/Promo2025");
    }

    #[tokio::test]
    async fn test_create_invalid_custom_code() {
        let service = service(
            MockShortLinkRepository::new(),
            MockVisitRepository::new(),
            MockCacheService::new(),
        );

        for code in ["ab", "has-dash", "abcdefghijklmnopqrstu"] {
            let err = service
                .create_short_link(request(Some(code)))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ShortLinkError::InvalidCode { .. }),
                "{code} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_create_custom_code_in_use() {
        let mut links = MockShortLinkRepository::new();

        links
            .expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(create_test_link(5, code, None))));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let err = service
            .create_short_link(request(Some("taken")))
            .await
            .unwrap_err();

        assert!(matches!(err, ShortLinkError::CodeInUse { code } if code == "taken"));
    }

    #[tokio::test]
    async fn test_create_unique_violation_race_maps_to_code_in_use() {
        let mut links = MockShortLinkRepository::new();

        links.expect_find_by_code().returning(|_| Ok(None));
        links.expect_create().times(1).returning(|_| {
            Err(StoreError::UniqueViolation {
                constraint: "short_links_code_active_idx".to_string(),
            })
        });

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let err = service
            .create_short_link(request(Some("racer")))
            .await
            .unwrap_err();

        assert!(matches!(err, ShortLinkError::CodeInUse { code } if code == "racer"));
    }

    #[tokio::test]
    async fn test_create_store_failure_propagates() {
        let mut links = MockShortLinkRepository::new();

        links.expect_find_by_code().returning(|_| Ok(None));
        links
            .expect_create()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let err = service.create_short_link(request(None)).await.unwrap_err();

        assert!(matches!(err, ShortLinkError::Store(_)));
    }

    #[tokio::test]
    async fn test_create_swallows_cache_failure() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        links.expect_find_by_code().returning(|_| Ok(None));
        links
            .expect_create()
            .returning(|new_link| Ok(link_from_new(new_link)));
        cache
            .expect_set_with_ttl()
            .times(1)
            .returning(|_, _, _| Err(CacheError::OperationError("down".to_string())));

        let service = service(links, MockVisitRepository::new(), cache);

        assert!(service.create_short_link(request(None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_caches_with_ttl_bounded_by_expiry() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        links.expect_find_by_code().returning(|_| Ok(None));
        links
            .expect_create()
            .returning(|new_link| Ok(link_from_new(new_link)));
        cache
            .expect_set_with_ttl()
            .withf(|_, _, ttl| {
                *ttl <= std::time::Duration::from_secs(600)
                    && *ttl > std::time::Duration::from_secs(590)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        let mut req = request(None);
        req.expires_at = Some(Utc::now() + ChronoDuration::minutes(10));

        assert!(service.create_short_link(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_already_expired_link_is_not_cached() {
        let mut links = MockShortLinkRepository::new();

        links.expect_find_by_code().returning(|_| Ok(None));
        links
            .expect_create()
            .returning(|new_link| Ok(link_from_new(new_link)));

        // No cache expectations: any cache call would panic.
        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let mut req = request(None);
        req.expires_at = Some(Utc::now() - ChronoDuration::minutes(1));

        assert!(service.create_short_link(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_skips_store() {
        let mut cache = MockCacheService::new();

        cache
            .expect_get()
            .withf(|key| key == "abc123")
            .times(1)
            .returning(|_| Ok(Some("-\thttps://example.com/cached".to_string())));

        let service = service(
            MockShortLinkRepository::new(),
            MockVisitRepository::new(),
            cache,
        );

        let url = service.resolve("abc123").await.unwrap();

        assert_eq!(url, "https://example.com/cached");
    }

    #[tokio::test]
    async fn test_resolve_stale_cache_entry_for_expired_link_is_not_found() {
        let mut cache = MockCacheService::new();
        let expired = CachedTarget {
            original_url: "https://example.com/old".to_string(),
            expires_at: Some(Utc::now() - ChronoDuration::seconds(5)),
        }
        .encode();

        cache
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(expired.clone())));
        cache
            .expect_invalidate()
            .withf(|key| key == "old")
            .times(1)
            .returning(|_| Ok(()));

        let service = service(
            MockShortLinkRepository::new(),
            MockVisitRepository::new(),
            cache,
        );

        let err = service.resolve("old").await.unwrap_err();

        assert!(matches!(err, ShortLinkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_miss_increments_once_and_repopulates_cache() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();
        let (inc_tx, mut inc_rx) = mpsc::unbounded_channel();
        let (set_tx, mut set_rx) = mpsc::unbounded_channel();

        cache.expect_get().times(1).returning(|_| Ok(None));
        links
            .expect_find_by_code()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|code| Ok(Some(create_test_link(42, code, None))));
        links
            .expect_increment_visit_count()
            .withf(|id| *id == 42)
            .times(1)
            .returning(move |_| {
                let _ = inc_tx.send(());
                Ok(())
            });
        cache
            .expect_set_with_ttl()
            .withf(|key, value, ttl| {
                key == "abc123"
                    && value == "-\thttps://example.com/abc123"
                    && *ttl == DEFAULT_CACHE_TTL
            })
            .times(1)
            .returning(move |_, _, _| {
                let _ = set_tx.send(());
                Ok(())
            });

        let service = service(links, MockVisitRepository::new(), cache);

        let url = service.resolve("abc123").await.unwrap();

        assert_eq!(url, "https://example.com/abc123");
        signalled(&mut inc_rx).await;
        signalled(&mut set_rx).await;
    }

    #[tokio::test]
    async fn test_resolve_cache_error_falls_back_to_store() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        cache
            .expect_get()
            .returning(|_| Err(CacheError::ConnectionError("refused".to_string())));
        links
            .expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(create_test_link(7, code, None))));
        links.expect_increment_visit_count().returning(|_| Ok(()));
        cache
            .expect_set_with_ttl()
            .returning(|_, _, _| Err(CacheError::ConnectionError("refused".to_string())));

        let service = service(links, MockVisitRepository::new(), cache);

        assert_eq!(
            service.resolve("xyz").await.unwrap(),
            "https://example.com/xyz"
        );
    }

    #[tokio::test]
    async fn test_resolve_undecodable_cache_entry_falls_back_to_store() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        cache
            .expect_get()
            .returning(|_| Ok(Some("https://legacy.example.com".to_string())));
        links
            .expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(create_test_link(7, code, None))));
        links.expect_increment_visit_count().returning(|_| Ok(()));
        cache.expect_set_with_ttl().returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        assert_eq!(
            service.resolve("xyz").await.unwrap(),
            "https://example.com/xyz"
        );
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        cache.expect_get().returning(|_| Ok(None));
        links.expect_find_by_code().returning(|_| Ok(None));

        let service = service(links, MockVisitRepository::new(), cache);

        let err = service.resolve("missing").await.unwrap_err();

        assert!(matches!(err, ShortLinkError::NotFound { code } if code == "missing"));
    }

    #[tokio::test]
    async fn test_resolve_expired_store_record_is_not_found() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        cache.expect_get().returning(|_| Ok(None));
        links.expect_find_by_code().returning(|code| {
            Ok(Some(create_test_link(
                1,
                code,
                Some(Utc::now() - ChronoDuration::minutes(1)),
            )))
        });

        // No increment or cache write expectations: the link is expired.
        let service = service(links, MockVisitRepository::new(), cache);

        let err = service.resolve("gone").await.unwrap_err();

        assert!(matches!(err, ShortLinkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_increment_failure_is_swallowed() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        cache.expect_get().returning(|_| Ok(None));
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(create_test_link(9, code, None))));
        links.expect_increment_visit_count().returning(move |_| {
            let _ = tx.send(());
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        });
        cache.expect_set_with_ttl().returning(|_, _, _| Ok(()));

        let service = service(links, MockVisitRepository::new(), cache);

        assert!(service.resolve("abc").await.is_ok());
        signalled(&mut rx).await;
    }

    #[tokio::test]
    async fn test_resolve_store_failure_propagates() {
        let mut links = MockShortLinkRepository::new();
        let mut cache = MockCacheService::new();

        cache.expect_get().returning(|_| Ok(None));
        links
            .expect_find_by_code()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let service = service(links, MockVisitRepository::new(), cache);

        assert!(matches!(
            service.resolve("abc").await.unwrap_err(),
            ShortLinkError::Store(_)
        ));
    }

    #[tokio::test]
    async fn test_record_visit_uses_durable_id() {
        let mut visits = MockVisitRepository::new();

        visits
            .expect_create()
            .withf(|new_visit| {
                new_visit.short_link_id == 42
                    && new_visit.user_agent.as_deref() == Some("TestBot/1.0")
            })
            .times(1)
            .returning(|v| {
                Ok(Visit::new(
                    1,
                    v.short_link_id,
                    v.client_ip,
                    v.user_agent,
                    v.referer,
                    Utc::now(),
                ))
            });

        let service = service(
            MockShortLinkRepository::new(),
            visits,
            MockCacheService::new(),
        );

        let metadata = VisitMetadata {
            user_agent: Some("TestBot/1.0".to_string()),
            ..Default::default()
        };
        let visit = service.record_visit(42, metadata).await.unwrap();

        assert_eq!(visit.short_link_id, 42);
    }

    #[tokio::test]
    async fn test_record_visit_failure_propagates() {
        let mut visits = MockVisitRepository::new();

        visits
            .expect_create()
            .returning(|_| Err(StoreError::Unavailable("disk full".to_string())));

        let service = service(
            MockShortLinkRepository::new(),
            visits,
            MockCacheService::new(),
        );

        let err = service
            .record_visit(1, VisitMetadata::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ShortLinkError::Store(_)));
    }

    #[tokio::test]
    async fn test_record_visit_for_code_resolves_id_not_visit_count() {
        let mut links = MockShortLinkRepository::new();
        let mut visits = MockVisitRepository::new();

        // visit_count is 3 in the fixture; the visit must reference id 77.
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(create_test_link(77, code, None))));
        visits
            .expect_create()
            .withf(|new_visit| new_visit.short_link_id == 77)
            .times(1)
            .returning(|v| {
                Ok(Visit::new(
                    1,
                    v.short_link_id,
                    None,
                    None,
                    None,
                    Utc::now(),
                ))
            });

        let service = service(links, visits, MockCacheService::new());

        assert!(
            service
                .record_visit_for_code("abc", VisitMetadata::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_record_visit_for_unknown_code() {
        let mut links = MockShortLinkRepository::new();
        links.expect_find_by_code().returning(|_| Ok(None));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let err = service
            .record_visit_for_code("nope", VisitMetadata::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ShortLinkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_stats_reads_store_only() {
        let mut links = MockShortLinkRepository::new();
        let expires_at = Utc::now() + ChronoDuration::days(1);

        links
            .expect_find_by_code()
            .times(1)
            .returning(move |code| Ok(Some(create_test_link(1, code, Some(expires_at)))));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        let stats = service.get_stats("abc123").await.unwrap();

        assert_eq!(stats.short_url, "https://sho.rt/abc123");
        assert_eq!(stats.original_url, "https://example.com/abc123");
        assert_eq!(stats.visit_count, 3);
        assert_eq!(stats.expires_at, Some(expires_at));
    }

    #[tokio::test]
    async fn test_get_stats_expired_is_not_found() {
        let mut links = MockShortLinkRepository::new();

        links.expect_find_by_code().returning(|code| {
            Ok(Some(create_test_link(
                1,
                code,
                Some(Utc::now() - ChronoDuration::seconds(1)),
            )))
        });

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        assert!(matches!(
            service.get_stats("abc").await.unwrap_err(),
            ShortLinkError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired_returns_count() {
        let mut links = MockShortLinkRepository::new();
        let before = Utc::now();

        links
            .expect_delete_expired()
            .withf(move |now| *now >= before)
            .times(1)
            .returning(|_| Ok(4));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        assert_eq!(service.cleanup_expired().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cleanup_store_failure_propagates() {
        let mut links = MockShortLinkRepository::new();

        links
            .expect_delete_expired()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let service = service(links, MockVisitRepository::new(), MockCacheService::new());

        assert!(service.cleanup_expired().await.is_err());
    }

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let service = service(
            MockShortLinkRepository::new(),
            MockVisitRepository::new(),
            MockCacheService::new(),
        );

        assert_eq!(service.short_url("abc"), "https://sho.rt/abc");
    }
}
