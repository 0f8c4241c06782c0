//! DTOs for the short link creation endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{CreateShortLink, CreatedShortLink};

/// Request to create a short link.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    /// The URL to shorten.
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    /// Optional expiry. The link stops resolving at this instant.
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional custom short code. An empty string is treated as absent;
    /// format rules are enforced by the service.
    #[serde(default)]
    pub custom_code: Option<String>,
}

impl CreateUrlRequest {
    pub fn into_command(self, creator_ip: Option<String>) -> CreateShortLink {
        CreateShortLink {
            original_url: self.original_url,
            expires_at: self.expires_at,
            custom_code: self.custom_code.filter(|code| !code.is_empty()),
            creator_ip,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUrlResponse {
    pub short_url: String,
    pub original_url: String,
    pub short_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CreatedShortLink> for CreateUrlResponse {
    fn from(created: CreatedShortLink) -> Self {
        Self {
            short_url: created.short_url,
            original_url: created.original_url,
            short_code: created.short_code,
            expires_at: created.expires_at,
            created_at: created.created_at,
        }
    }
}
