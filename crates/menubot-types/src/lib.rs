//! Shared domain types for Menubot.
//!
//! This crate holds the data shapes exchanged between the core logic,
//! the infrastructure layer, and the API layer: identities, sessions,
//! conversation turns, LLM request/stream types, configuration, and the
//! error taxonomy. It performs no I/O.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
