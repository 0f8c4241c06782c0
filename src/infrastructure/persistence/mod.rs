//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgShortLinkRepository`] - PostgreSQL short link storage
//! - [`PgVisitRepository`] - PostgreSQL visit records
//! - [`MemoryShortLinkRepository`] / [`MemoryVisitRepository`] - In-process stores

pub mod memory_repository;
pub mod pg_short_link_repository;
pub mod pg_visit_repository;

pub use memory_repository::{MemoryShortLinkRepository, MemoryVisitRepository};
pub use pg_short_link_repository::PgShortLinkRepository;
pub use pg_visit_repository::PgVisitRepository;
