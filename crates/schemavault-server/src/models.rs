//! API models for requests and responses

pub mod api;

// Re-export commonly used types
pub use api::*;
