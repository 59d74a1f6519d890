//! Streaming chat orchestrator.
//!
//! Binds one stateless request to its stateful conversation: loads the
//! session's recent history, issues the model call, relays fragments to
//! the caller as they arrive, and durably appends the exchange when the
//! stream finishes.
//!
//! Persistence policy (explicit design choices):
//! - If the provider fails before producing any output, nothing is
//!   written: the human turn is not persisted without a response.
//! - If the caller disconnects or the provider fails mid-stream, the
//!   partial assistant turn IS persisted. A cancelled stream is treated
//!   as a completed turn with truncated content; losing the record of
//!   what was already said would be worse for auditability.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::{debug, error, warn};
use uuid::Uuid;

use menubot_types::chat::TurnRole;
use menubot_types::config::{ChatConfig, LlmConfig};
use menubot_types::error::{ChatError, StorageError};
use menubot_types::llm::{CompletionRequest, Message, MessageRole, StreamEvent};

use crate::llm::provider::LlmProvider;
use crate::llm::retry::{self, RetryPolicy};
use crate::prompt::{normalize_location, PromptTemplate};

use super::repository::HistoryRepository;

/// Orchestrates one chat exchange end to end.
///
/// Generic over the history repository and the model provider so the
/// core stays independent of infrastructure.
pub struct ChatService<H, P> {
    history: Arc<H>,
    provider: Arc<P>,
    prompt: PromptTemplate,
    llm_config: LlmConfig,
    chat_config: ChatConfig,
}

impl<H, P> ChatService<H, P>
where
    H: HistoryRepository + 'static,
    P: LlmProvider + 'static,
{
    pub fn new(
        history: Arc<H>,
        provider: Arc<P>,
        prompt: PromptTemplate,
        llm_config: LlmConfig,
        chat_config: ChatConfig,
    ) -> Self {
        Self {
            history,
            provider,
            prompt,
            llm_config,
            chat_config,
        }
    }

    /// Stream the assistant's reply to `message` within `session_id`.
    ///
    /// Establishes the model stream (with bounded retries) before
    /// returning, so a generation failure that produces no output
    /// surfaces as an `Err` here and nothing is appended to history.
    /// The returned stream is finite and not restartable.
    pub async fn stream(
        &self,
        session_id: Uuid,
        message: String,
        user_name: String,
        location: Option<String>,
    ) -> Result<impl Stream<Item = Result<String, ChatError>> + Send + 'static, ChatError> {
        let location = normalize_location(location.as_deref());
        let request = self.build_request(&session_id, &message, &user_name, &location).await?;

        let policy = RetryPolicy::from_config(&self.llm_config);
        let mut upstream = retry::establish(self.provider.as_ref(), request, policy).await?;

        let idle_timeout = policy.timeout;
        let mut guard = PersistGuard::new(Arc::clone(&self.history), session_id, message);

        Ok(async_stream::stream! {
            loop {
                match tokio::time::timeout(idle_timeout, upstream.next()).await {
                    Ok(Some(Ok(StreamEvent::TextDelta { text }))) => {
                        guard.push(&text);
                        yield Ok(text);
                    }
                    Ok(Some(Ok(StreamEvent::Connected))) => continue,
                    Ok(Some(Ok(StreamEvent::Done))) | Ok(None) => {
                        if let Err(e) = guard.finish().await {
                            yield Err(ChatError::Storage(e));
                        }
                        return;
                    }
                    Ok(Some(Err(e))) => {
                        // Mid-stream failure: the caller keeps what was
                        // already sent, the partial reply is persisted,
                        // and the stream simply ends.
                        warn!(%session_id, error = %e, "model stream failed mid-response");
                        if let Err(pe) = guard.finish().await {
                            error!(%session_id, error = %pe, "failed to persist partial exchange");
                        }
                        return;
                    }
                    Err(_) => {
                        warn!(%session_id, "model stream idle timeout mid-response");
                        if let Err(pe) = guard.finish().await {
                            error!(%session_id, error = %pe, "failed to persist partial exchange");
                        }
                        return;
                    }
                }
            }
        })
    }

    /// Load the bounded history window and assemble the model request.
    async fn build_request(
        &self,
        session_id: &Uuid,
        message: &str,
        user_name: &str,
        location: &str,
    ) -> Result<CompletionRequest, ChatError> {
        let window = self.chat_config.history_window;
        let history = self.history.tail(session_id, window).await?;
        debug!(%session_id, turns = history.len(), "loaded context window");

        let mut messages: Vec<Message> = history
            .iter()
            .map(|turn| Message {
                role: match turn.role {
                    TurnRole::Human => MessageRole::User,
                    TurnRole::Ai => MessageRole::Assistant,
                },
                content: turn.content.clone(),
            })
            .collect();
        messages.push(Message::user(message));

        Ok(CompletionRequest {
            model: self.llm_config.model.clone(),
            messages,
            system: Some(self.prompt.render(user_name, location)),
            max_tokens: self.llm_config.max_tokens,
            temperature: Some(self.llm_config.temperature),
            stream: true,
        })
    }
}

/// Accumulates the exchange and guarantees the persistence policy.
///
/// The happy path calls [`finish`](PersistGuard::finish), which appends
/// the human turn and the full reply inline. If the stream is dropped
/// early (client disconnect) with output already emitted, `Drop` spawns
/// the append so the truncated reply still reaches the ledger. A guard
/// dropped before any output writes nothing.
struct PersistGuard<H: HistoryRepository + 'static> {
    inner: Option<GuardInner<H>>,
}

struct GuardInner<H> {
    history: Arc<H>,
    session_id: Uuid,
    human: String,
    reply: String,
}

impl<H: HistoryRepository + 'static> PersistGuard<H> {
    fn new(history: Arc<H>, session_id: Uuid, human: String) -> Self {
        Self {
            inner: Some(GuardInner {
                history,
                session_id,
                human,
                reply: String::new(),
            }),
        }
    }

    fn push(&mut self, fragment: &str) {
        if let Some(inner) = &mut self.inner {
            inner.reply.push_str(fragment);
        }
    }

    async fn finish(&mut self) -> Result<(), StorageError> {
        match self.inner.take() {
            Some(inner) => append_exchange(inner).await,
            None => Ok(()),
        }
    }
}

impl<H: HistoryRepository + 'static> Drop for PersistGuard<H> {
    fn drop(&mut self) {
        let Some(inner) = self.inner.take() else {
            return;
        };
        if inner.reply.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let session_id = inner.session_id;
                handle.spawn(async move {
                    if let Err(e) = append_exchange(inner).await {
                        error!(%session_id, error = %e, "failed to persist exchange after disconnect");
                    }
                });
            }
            Err(_) => {
                warn!(session_id = %inner.session_id, "no runtime available; partial exchange lost");
            }
        }
    }
}

async fn append_exchange<H: HistoryRepository>(inner: GuardInner<H>) -> Result<(), StorageError> {
    inner
        .history
        .append(&inner.session_id, TurnRole::Human, &inner.human)
        .await?;
    inner
        .history
        .append(&inner.session_id, TurnRole::Ai, &inner.reply)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{MemoryHistoryRepository, ScriptedProvider};
    use menubot_types::llm::LlmError;

    fn service(
        provider: ScriptedProvider,
    ) -> (
        ChatService<MemoryHistoryRepository, ScriptedProvider>,
        Arc<MemoryHistoryRepository>,
    ) {
        let history = Arc::new(MemoryHistoryRepository::default());
        let service = ChatService::new(
            Arc::clone(&history),
            Arc::new(provider),
            PromptTemplate::default(),
            LlmConfig::default(),
            ChatConfig::default(),
        );
        (service, history)
    }

    async fn collect(
        stream: impl Stream<Item = Result<String, ChatError>>,
    ) -> Vec<Result<String, ChatError>> {
        futures_util::pin_mut!(stream);
        stream.collect().await
    }

    #[tokio::test]
    async fn test_stream_relays_fragments_and_persists_exchange() {
        let (service, history) = service(ScriptedProvider::replying(&["Hel", "lo", "!"]));
        let session_id = Uuid::new_v4();

        let stream = service
            .stream(session_id, "Hi".to_string(), "alice".to_string(), None)
            .await
            .unwrap();
        let chunks: Vec<String> = collect(stream).await.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(chunks, vec!["Hel", "lo", "!"]);

        let turns = history.turns_for(&session_id);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::Human);
        assert_eq!(turns[0].content, "Hi");
        assert_eq!(turns[1].role, TurnRole::Ai);
        assert_eq!(turns[1].content, "Hello!");
    }

    #[tokio::test]
    async fn test_generation_failure_before_output_persists_nothing() {
        let scripts = (0..3)
            .map(|_| vec![Err(LlmError::RateLimited)])
            .collect();
        let (service, history) = service(ScriptedProvider::new(scripts));
        let session_id = Uuid::new_v4();

        let err = service
            .stream(session_id, "Hi".to_string(), "alice".to_string(), None)
            .await
            .err()
            .expect("establishment should fail");
        assert!(matches!(err, ChatError::Generation(_)));
        assert!(history.turns_for(&session_id).is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_persists_partial_reply() {
        let script = vec![
            Ok(StreamEvent::Connected),
            Ok(StreamEvent::TextDelta {
                text: "partial".to_string(),
            }),
            Err(LlmError::Stream("connection reset".to_string())),
        ];
        let (service, history) = service(ScriptedProvider::new(vec![script]));
        let session_id = Uuid::new_v4();

        let stream = service
            .stream(session_id, "Hi".to_string(), "alice".to_string(), None)
            .await
            .unwrap();
        let results = collect(stream).await;
        // The fragment already sent reaches the caller, then the stream ends.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap(), "partial");

        let turns = history.turns_for(&session_id);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "partial");
    }

    #[tokio::test]
    async fn test_dropped_stream_persists_partial_reply() {
        let (service, history) = service(ScriptedProvider::replying(&["one", "two", "three"]));
        let session_id = Uuid::new_v4();

        {
            let stream = service
                .stream(session_id, "Hi".to_string(), "alice".to_string(), None)
                .await
                .unwrap();
            futures_util::pin_mut!(stream);
            let first = stream.next().await.unwrap().unwrap();
            assert_eq!(first, "one");
            // Caller disconnects here.
        }

        // Drop persistence runs on a spawned task.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let turns = history.turns_for(&session_id);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "Hi");
        assert_eq!(turns[1].content, "one");
    }

    #[tokio::test]
    async fn test_history_window_bounds_context() {
        let provider = ScriptedProvider::replying(&["ok"]);
        let history = Arc::new(MemoryHistoryRepository::default());
        let service = ChatService::new(
            Arc::clone(&history),
            Arc::new(provider),
            PromptTemplate::default(),
            LlmConfig::default(),
            ChatConfig { history_window: 4 },
        );
        let session_id = Uuid::new_v4();
        for i in 0..10 {
            history
                .append(&session_id, TurnRole::Human, &format!("q{i}"))
                .await
                .unwrap();
            history
                .append(&session_id, TurnRole::Ai, &format!("a{i}"))
                .await
                .unwrap();
        }

        let stream = service
            .stream(session_id, "latest".to_string(), "alice".to_string(), None)
            .await
            .unwrap();
        let _ = collect(stream).await;

        let request = service.provider.last_request().unwrap();
        // 4 windowed turns plus the new user message.
        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[0].content, "a8");
        assert_eq!(request.messages[4].content, "latest");
    }

    #[tokio::test]
    async fn test_location_defaults_to_unknown_in_context() {
        let (service, _history) = service(ScriptedProvider::replying(&["ok"]));
        let stream = service
            .stream(
                Uuid::new_v4(),
                "Hi".to_string(),
                "alice".to_string(),
                Some("  ".to_string()),
            )
            .await
            .unwrap();
        let _ = collect(stream).await;

        let request = service.provider.last_request().unwrap();
        let system = request.system.unwrap();
        assert!(system.contains("Location: unknown"));
        assert!(system.contains("User Name: alice"));
    }

    #[tokio::test]
    async fn test_round_trip_ordering() {
        let (service, history) = service(ScriptedProvider::replying(&["reply"]));
        let session_id = Uuid::new_v4();
        let stream = service
            .stream(session_id, "msg".to_string(), "bob".to_string(), None)
            .await
            .unwrap();
        let _ = collect(stream).await;

        let turns = history.list(&session_id).await.unwrap();
        let pairs: Vec<(TurnRole, &str)> =
            turns.iter().map(|t| (t.role, t.content.as_str())).collect();
        assert_eq!(
            pairs,
            vec![(TurnRole::Human, "msg"), (TurnRole::Ai, "reply")]
        );
    }
}
