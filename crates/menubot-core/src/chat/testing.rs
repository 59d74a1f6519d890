//! In-memory repository and provider fakes shared by chat service tests.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use futures_util::Stream;
use uuid::Uuid;

use menubot_types::chat::{Session, Turn, TurnRole};
use menubot_types::error::StorageError;
use menubot_types::identity::UserIdentity;
use menubot_types::llm::{CompletionRequest, LlmError, StreamEvent};

use crate::chat::repository::{HistoryRepository, IdentityRepository, SessionRepository};
use crate::llm::provider::LlmProvider;

#[derive(Default)]
pub struct MemoryIdentityRepository {
    users: Mutex<Vec<UserIdentity>>,
    next_id: AtomicI64,
}

impl IdentityRepository for MemoryIdentityRepository {
    async fn ensure_user(&self, username: &str) -> Result<UserIdentity, StorageError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter().find(|u| u.username == username) {
            return Ok(user.clone());
        }
        let user = UserIdentity {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: username.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionRepository for MemorySessionRepository {
    async fn get(&self, session_id: &Uuid) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn insert(&self, session: &Session) -> Result<(), StorageError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            return Err(StorageError::Conflict(format!(
                "session {} exists",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHistoryRepository {
    turns: Mutex<Vec<Turn>>,
    next_id: AtomicI64,
}

impl MemoryHistoryRepository {
    pub fn turns_for(&self, session_id: &Uuid) -> Vec<Turn> {
        self.turns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.session_id == session_id)
            .cloned()
            .collect()
    }
}

impl HistoryRepository for MemoryHistoryRepository {
    async fn append(
        &self,
        session_id: &Uuid,
        role: TurnRole,
        content: &str,
    ) -> Result<Turn, StorageError> {
        let mut turns = self.turns.lock().unwrap();
        let seq = turns
            .iter()
            .filter(|t| &t.session_id == session_id)
            .map(|t| t.seq)
            .max()
            .unwrap_or(0)
            + 1;
        let turn = Turn {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            session_id: *session_id,
            role,
            content: content.to_string(),
            seq,
            created_at: Utc::now(),
        };
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn list(&self, session_id: &Uuid) -> Result<Vec<Turn>, StorageError> {
        let mut turns = self.turns_for(session_id);
        turns.sort_by_key(|t| t.seq);
        Ok(turns)
    }

    async fn tail(&self, session_id: &Uuid, limit: u32) -> Result<Vec<Turn>, StorageError> {
        let mut turns = self.list(session_id).await?;
        let skip = turns.len().saturating_sub(limit as usize);
        Ok(turns.split_off(skip))
    }
}

/// A scripted provider: each call to `stream` pops the next script.
///
/// Scripts are lists of events/errors replayed verbatim, letting tests
/// model success, pre-output failure, and mid-stream failure.
pub struct ScriptedProvider {
    scripts: Mutex<Vec<Vec<Result<StreamEvent, LlmError>>>>,
    pub calls: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Vec<Result<StreamEvent, LlmError>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Single successful run emitting the given text fragments.
    pub fn replying(fragments: &[&str]) -> Self {
        let mut events = vec![Ok(StreamEvent::Connected)];
        events.extend(
            fragments
                .iter()
                .map(|f| Ok(StreamEvent::TextDelta { text: f.to_string() })),
        );
        events.push(Ok(StreamEvent::Done));
        Self::new(vec![events])
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        let mut scripts = self.scripts.lock().unwrap();
        let script = if scripts.is_empty() {
            vec![Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            })]
        } else {
            scripts.remove(0)
        };
        Box::pin(futures_util::stream::iter(script))
    }
}
