//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod create_url;
pub mod health;
pub mod redirect;
pub mod stats;

pub use create_url::create_url_handler;
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use stats::stats_handler;
