//! Application state wiring all services together.
//!
//! `AppState` pins the generic core services to their concrete infra
//! implementations and is constructed exactly once at process start:
//! the storage pool, repositories, resolver, prompt, and model provider
//! are built here and injected into every request-scoped unit of work.
//! The provider stays a type parameter so handler tests can substitute
//! a scripted one.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::warn;

use menubot_core::chat::resolver::SessionResolver;
use menubot_core::chat::service::ChatService;
use menubot_core::llm::provider::LlmProvider;
use menubot_core::prompt::PromptTemplate;
use menubot_infra::config::{load_global_config, load_system_prompt, resolve_data_dir};
use menubot_infra::llm::openai_compat::OpenAiCompatProvider;
use menubot_infra::sqlite::history::SqliteHistoryRepository;
use menubot_infra::sqlite::identity::SqliteIdentityRepository;
use menubot_infra::sqlite::pool::DatabasePool;
use menubot_infra::sqlite::session::SqliteSessionRepository;
use menubot_types::config::GlobalConfig;

/// Concrete type alias pinning the resolver generics.
pub type ConcreteResolver = SessionResolver<SqliteIdentityRepository, SqliteSessionRepository>;

/// Shared application state used by both CLI commands and HTTP handlers.
pub struct AppState<P: LlmProvider + 'static = OpenAiCompatProvider> {
    pub resolver: Arc<ConcreteResolver>,
    pub chat_service: Arc<ChatService<SqliteHistoryRepository, P>>,
    pub sessions: Arc<SqliteSessionRepository>,
    pub history: Arc<SqliteHistoryRepository>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

// Manual impl: everything is behind an Arc, P itself need not be Clone.
impl<P: LlmProvider + 'static> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            chat_service: Arc::clone(&self.chat_service),
            sessions: Arc::clone(&self.sessions),
            history: Arc::clone(&self.history),
            config: Arc::clone(&self.config),
            data_dir: self.data_dir.clone(),
        }
    }
}

impl<P: LlmProvider + 'static> AppState<P> {
    /// Wire repositories and services around an open database pool.
    pub fn assemble(
        db_pool: DatabasePool,
        provider: Arc<P>,
        prompt: PromptTemplate,
        config: GlobalConfig,
        data_dir: PathBuf,
    ) -> Self {
        let identity = Arc::new(SqliteIdentityRepository::new(db_pool.clone()));
        let sessions = Arc::new(SqliteSessionRepository::new(db_pool.clone()));
        let history = Arc::new(SqliteHistoryRepository::new(db_pool));

        let resolver = Arc::new(SessionResolver::new(identity, Arc::clone(&sessions)));

        let chat_service = Arc::new(ChatService::new(
            Arc::clone(&history),
            provider,
            prompt,
            config.llm.clone(),
            config.chat.clone(),
        ));

        Self {
            resolver,
            chat_service,
            sessions,
            history,
            config: Arc::new(config),
            data_dir,
        }
    }
}

impl AppState {
    /// Initialize the application: data dir, database, services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("menubot.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        // A missing provider key degrades to failing generation rather
        // than aborting startup; history queries still work.
        let api_key = match std::env::var(&config.llm.api_key_env) {
            Ok(key) if !key.is_empty() => SecretString::from(key),
            _ => {
                warn!(
                    env = %config.llm.api_key_env,
                    "provider API key not set; chat requests will fail"
                );
                SecretString::from("")
            }
        };
        let provider = Arc::new(OpenAiCompatProvider::new(
            provider_name_for(&config.llm.base_url),
            &config.llm.base_url,
            &api_key,
        ));

        let prompt = match load_system_prompt(&data_dir).await {
            Some(base) => PromptTemplate::new(base),
            None => PromptTemplate::default(),
        };

        Ok(Self::assemble(db_pool, provider, prompt, config, data_dir))
    }
}

/// Log-friendly provider name for a configured base URL.
fn provider_name_for(base_url: &str) -> &'static str {
    if base_url.contains("groq.com") {
        "groq"
    } else if base_url.contains("api.openai.com") {
        "openai"
    } else {
        "openai-compat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name_follows_base_url() {
        assert_eq!(provider_name_for("https://api.groq.com/openai/v1"), "groq");
        assert_eq!(provider_name_for("https://api.openai.com/v1"), "openai");
        assert_eq!(
            provider_name_for("http://localhost:11434/v1"),
            "openai-compat"
        );
    }
}
