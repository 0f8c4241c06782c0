//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for testing.
//!
//! # Available Repositories
//!
//! - [`ShortLinkRepository`] - Short link records, visit counters and expiry sweeps
//! - [`VisitRepository`] - Append-only visit records

pub mod short_link_repository;
pub mod visit_repository;

pub use short_link_repository::ShortLinkRepository;
pub use visit_repository::VisitRepository;

#[cfg(test)]
pub use short_link_repository::MockShortLinkRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
