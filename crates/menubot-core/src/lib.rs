//! Core business logic for Menubot.
//!
//! Defines the repository and provider traits (implemented in
//! `menubot-infra`) and the services built on top of them: session
//! resolution and the streaming chat orchestrator. This crate never
//! depends on infrastructure.

pub mod chat;
pub mod llm;
pub mod prompt;
