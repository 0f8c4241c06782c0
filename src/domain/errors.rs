//! Error taxonomy for short link allocation and resolution.

use thiserror::Error;

use crate::utils::code_generator::GeneratorError;

/// Failures reported by the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write collided with the unique index on live short codes.
    #[error("unique constraint violation ({constraint})")]
    UniqueViolation { constraint: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend-specific failure for stores that are not SQL-backed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Errors returned by [`crate::application::services::ResolutionService`].
///
/// Cache failures never appear here: they are logged and swallowed.
#[derive(Debug, Error)]
pub enum ShortLinkError {
    /// The custom code fails the length or alphabet rules.
    #[error("invalid custom code: {code}")]
    InvalidCode { code: String },

    /// The code is held by a live record, or lost a uniqueness race at write time.
    #[error("short code already in use: {code}")]
    CodeInUse { code: String },

    /// Every generated candidate collided with an existing live code.
    #[error("failed to allocate a unique short code after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// The code is absent, deleted, or expired.
    #[error("short code not found: {code}")]
    NotFound { code: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

impl ShortLinkError {
    pub(crate) fn not_found(code: &str) -> Self {
        Self::NotFound {
            code: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_unique_violation() {
        let err = StoreError::UniqueViolation {
            constraint: "short_links_code_active_idx".to_string(),
        };

        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("short_links_code_active_idx"));
    }

    #[test]
    fn test_store_error_wraps_sqlx() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();

        assert!(!err.is_unique_violation());
        assert!(err.to_string().starts_with("database error"));
    }

    #[test]
    fn test_short_link_error_messages() {
        assert_eq!(
            ShortLinkError::not_found("abc").to_string(),
            "short code not found: abc"
        );
        assert_eq!(
            ShortLinkError::AllocationExhausted { attempts: 5 }.to_string(),
            "failed to allocate a unique short code after 5 attempts"
        );
    }
}
