//! HTTP/REST API layer.
//!
//! Axum-based API at `/api/v1/` with optional API key authentication,
//! envelope responses for JSON endpoints, and a plain-text streaming
//! body for chat.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
