//! LlmProvider trait definition.
//!
//! The single abstraction over model backends. `stream` returns a boxed
//! stream so providers stay object-safe behind generics and the stream
//! can be handed across task boundaries.

use std::pin::Pin;

use futures_util::Stream;

use menubot_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// A boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for model backends (Groq, OpenAI, test fakes).
///
/// Implementations live in menubot-infra (e.g. `OpenAiCompatProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name for logs.
    fn name(&self) -> &str;

    /// Send a streaming completion request. Lazily produces text deltas
    /// as the model generates; may fail before or during emission.
    fn stream(&self, request: CompletionRequest) -> EventStream;
}
