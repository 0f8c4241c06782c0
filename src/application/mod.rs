//! Application layer orchestrating the domain against its collaborators.
//!
//! # Contents
//!
//! - [`services::ResolutionService`] - Code allocation, cache-aside resolution, stats and cleanup
//! - [`cache_policy`] - Cache TTL derivation and cached value encoding
//! - [`visit_worker`] - Background consumer recording visit events
//! - [`cleanup`] - Periodic expired-link sweep

pub mod cache_policy;
pub mod cleanup;
pub mod services;
pub mod visit_worker;
