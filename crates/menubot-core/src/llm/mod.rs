//! LLM provider abstraction and the bounded retry layer.

pub mod provider;
pub mod retry;
