//! Chat domain: repositories, session resolution, and response streaming.

pub mod repository;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
