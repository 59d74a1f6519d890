//! Infrastructure implementations for Menubot.
//!
//! SQLite-backed repositories (sqlx, split reader/writer pools in WAL
//! mode), the OpenAI-compatible streaming LLM provider, and loading of
//! the data-directory configuration.

pub mod config;
pub mod llm;
pub mod sqlite;
