//! Domain layer containing business entities, errors and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`errors`] - Allocation, resolution and store error taxonomy
//! - [`visit_event`] - Visit tracking event model
//!
//! # Visit Processing Flow
//!
//! 1. Redirect handler resolves a short code
//! 2. [`visit_event::VisitEvent`] is sent to a bounded channel
//! 3. [`crate::application::visit_worker::run_visit_worker`] appends the visit with retry
//! 4. Visit data is persisted via [`repositories::VisitRepository`]

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod visit_event;
