//! Core domain entities.
//!
//! - [`ShortLink`] - A shortened URL mapping with visit counter and expiry
//! - [`Visit`] - An append-only record of a single resolution
//!
//! Entities use separate `New*` structs for creation.

pub mod short_link;
pub mod visit;

pub use short_link::{LinkState, NewShortLink, ShortLink};
pub use visit::{NewVisit, Visit, VisitMetadata};
