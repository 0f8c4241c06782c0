//! Cache TTL derivation and cached value encoding.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::entities::ShortLink;

/// TTL for links without an expiry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Derives how long a short link may stay in the cache.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    default_ttl: Duration,
}

impl CachePolicy {
    pub fn new(default_ttl: Duration) -> Self {
        Self { default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the TTL for a record expiring at `expires_at`, as seen at `now`.
    ///
    /// - No expiry: the default TTL.
    /// - Expiry in the future: `min(default, time until expiry)`.
    /// - Expiry at or before `now`: `None`, the record must not be cached.
    pub fn ttl_for(
        &self,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let Some(expires_at) = expires_at else {
            return Some(self.default_ttl);
        };

        let remaining = (expires_at - now).to_std().ok()?;
        if remaining.is_zero() {
            return None;
        }

        Some(remaining.min(self.default_ttl))
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// The value cached for a short code.
///
/// The expiry travels with the URL so a cache hit can be re-checked against
/// the current time without a store lookup. Encoded as a single line of text:
/// `<expiry unix millis or ->\t<original url>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTarget {
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedTarget {
    const NO_EXPIRY: &'static str = "-";
    const SEPARATOR: char = '\t';

    pub fn encode(&self) -> String {
        match self.expires_at {
            Some(expires_at) => format!(
                "{}{}{}",
                expires_at.timestamp_millis(),
                Self::SEPARATOR,
                self.original_url
            ),
            None => format!("{}{}{}", Self::NO_EXPIRY, Self::SEPARATOR, self.original_url),
        }
    }

    /// Parses an encoded value. Returns `None` for anything malformed.
    pub fn decode(raw: &str) -> Option<Self> {
        let (expiry, original_url) = raw.split_once(Self::SEPARATOR)?;
        if original_url.is_empty() {
            return None;
        }

        let expires_at = if expiry == Self::NO_EXPIRY {
            None
        } else {
            Some(DateTime::<Utc>::from_timestamp_millis(expiry.parse().ok()?)?)
        };

        Some(Self {
            original_url: original_url.to_string(),
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl From<&ShortLink> for CachedTarget {
    fn from(link: &ShortLink) -> Self {
        Self {
            original_url: link.original_url.clone(),
            expires_at: link.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_ttl_without_expiry_is_default() {
        let policy = CachePolicy::default();
        assert_eq!(policy.ttl_for(None, fixed_now()), Some(DEFAULT_CACHE_TTL));
        assert_eq!(DEFAULT_CACHE_TTL, Duration::from_secs(86_400));
    }

    #[test]
    fn test_ttl_is_time_until_expiry_when_shorter() {
        let now = fixed_now();
        let policy = CachePolicy::default();

        let ttl = policy.ttl_for(Some(now + ChronoDuration::minutes(10)), now);

        assert_eq!(ttl, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_ttl_is_capped_at_default() {
        let now = fixed_now();
        let policy = CachePolicy::default();

        let ttl = policy.ttl_for(Some(now + ChronoDuration::days(30)), now);

        assert_eq!(ttl, Some(DEFAULT_CACHE_TTL));
    }

    #[test]
    fn test_ttl_respects_custom_default() {
        let now = fixed_now();
        let policy = CachePolicy::new(Duration::from_secs(60));

        assert_eq!(policy.ttl_for(None, now), Some(Duration::from_secs(60)));
        assert_eq!(
            policy.ttl_for(Some(now + ChronoDuration::minutes(10)), now),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_expired_or_expiring_now_is_not_cached() {
        let now = fixed_now();
        let policy = CachePolicy::default();

        assert_eq!(policy.ttl_for(Some(now), now), None);
        assert_eq!(
            policy.ttl_for(Some(now - ChronoDuration::seconds(1)), now),
            None
        );
    }

    #[test]
    fn test_cached_target_round_trip_with_expiry() {
        let target = CachedTarget {
            original_url: "https://example.com/a?b=c#d".to_string(),
            expires_at: Some(fixed_now()),
        };

        let encoded = target.encode();

        assert_eq!(
            encoded,
            format!("{}\thttps://example.com/a?b=c#d", fixed_now().timestamp_millis())
        );
        assert_eq!(CachedTarget::decode(&encoded), Some(target));
    }

    #[test]
    fn test_cached_target_without_expiry() {
        let decoded = CachedTarget::decode("-\thttps://example.com").unwrap();

        assert_eq!(decoded.original_url, "https://example.com");
        assert!(decoded.expires_at.is_none());
        assert!(!decoded.is_expired_at(fixed_now()));
    }

    #[test]
    fn test_cached_target_rejects_malformed_values() {
        assert!(CachedTarget::decode("https://example.com").is_none());
        assert!(CachedTarget::decode("-\t").is_none());
        assert!(CachedTarget::decode("soon\thttps://example.com").is_none());
    }

    #[test]
    fn test_cached_target_expiry_check() {
        let now = fixed_now();
        let target = CachedTarget {
            original_url: "https://example.com".to_string(),
            expires_at: Some(now - ChronoDuration::minutes(1)),
        };

        assert!(target.is_expired_at(now));
    }
}
