//! Utility functions for code generation and request handling.
//!
//! - [`code_generator`] - Short code generation and validation
//! - [`db_error`] - SQLx error classification
//! - [`client_ip`] - Client address extraction

pub mod client_ip;
pub mod code_generator;
pub mod db_error;
