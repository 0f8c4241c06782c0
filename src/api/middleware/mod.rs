//! HTTP middleware for request processing.

pub mod metrics;
pub mod tracing;
