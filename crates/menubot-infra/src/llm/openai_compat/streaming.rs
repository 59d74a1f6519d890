//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] chunks to the
//! provider-agnostic event enum. Each chunk's text content becomes one
//! `TextDelta`; the end of the SSE stream becomes `Done`.

use futures_util::StreamExt;

use async_openai::types::chat::ChatCompletionResponseStream;

use menubot_core::llm::provider::EventStream;
use menubot_types::llm::{LlmError, StreamEvent};

/// Map an async-openai [`ChatCompletionResponseStream`] to domain events.
///
/// Event order: `Connected` immediately, `TextDelta` per nonempty text
/// chunk, `Done` when the stream ends.
pub fn map_openai_stream(stream: ChatCompletionResponseStream) -> EventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut stream = stream;
        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| LlmError::Stream(e.to_string()))?;

            for choice in &chunk.choices {
                if let Some(text) = &choice.delta.content {
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text: text.clone() };
                    }
                }
            }
        }

        yield StreamEvent::Done;
    })
}
