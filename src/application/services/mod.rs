//! Business logic services for the application layer.

pub mod resolution_service;

pub use resolution_service::{
    CreateShortLink, CreatedShortLink, LinkStats, MAX_GENERATION_ATTEMPTS, ResolutionService,
};

use crate::domain::repositories::{ShortLinkRepository, VisitRepository};

/// Resolution service over type-erased repositories, as held by the server state.
pub type SharedResolutionService = ResolutionService<dyn ShortLinkRepository, dyn VisitRepository>;
