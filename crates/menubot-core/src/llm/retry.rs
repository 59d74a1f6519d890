//! Bounded retry around stream establishment.
//!
//! A provider call only counts as established once it has produced its
//! first piece of output. Failures and timeouts before that point are
//! retried up to the attempt budget; after establishment the stream is
//! handed to the caller untouched and mid-stream failures become the
//! orchestrator's problem (persist-partial policy).

use std::time::Duration;

use futures_util::StreamExt;
use tracing::warn;

use menubot_types::config::LlmConfig;
use menubot_types::llm::{CompletionRequest, LlmError, StreamEvent};

use super::provider::{EventStream, LlmProvider};

/// Retry budget for one chat request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Per-attempt wait for the first output event.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Open a provider stream and wait for its first output event.
///
/// Returns a stream that re-emits the buffered first event followed by
/// the remainder. Transient pre-output failures (including an attempt
/// timeout and a stream that ends without producing text) consume one
/// attempt each; a non-transient error aborts immediately.
pub async fn establish<P: LlmProvider + ?Sized>(
    provider: &P,
    request: CompletionRequest,
    policy: RetryPolicy,
) -> Result<EventStream, LlmError> {
    let mut last_err = LlmError::Provider {
        message: "no attempts made".to_string(),
    };

    for attempt in 1..=policy.max_attempts {
        let mut stream = provider.stream(request.clone());

        match tokio::time::timeout(policy.timeout, first_output(&mut stream)).await {
            Ok(Ok(Some(event))) => {
                let head = futures_util::stream::iter([Ok(event)]);
                return Ok(Box::pin(head.chain(stream)));
            }
            Ok(Ok(None)) => {
                last_err = LlmError::Provider {
                    message: "stream ended before producing output".to_string(),
                };
            }
            Ok(Err(e)) if !e.is_transient() => return Err(e),
            Ok(Err(e)) => last_err = e,
            Err(_) => last_err = LlmError::Timeout(policy.timeout.as_secs()),
        }

        if attempt < policy.max_attempts {
            warn!(
                provider = provider.name(),
                attempt,
                error = %last_err,
                "stream establishment failed, retrying"
            );
        }
    }

    Err(last_err)
}

/// Advance past handshake events to the first text delta (or Done).
async fn first_output(
    stream: &mut EventStream,
) -> Result<Option<StreamEvent>, LlmError> {
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Connected => continue,
            StreamEvent::TextDelta { text } => {
                return Ok(Some(StreamEvent::TextDelta { text }));
            }
            StreamEvent::Done => return Ok(None),
        }
    }
    Ok(None)
}
