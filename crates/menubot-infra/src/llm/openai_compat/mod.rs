//! OpenAI-compatible LLM provider.
//!
//! One [`OpenAiCompatProvider`] serves any endpoint speaking the OpenAI
//! chat-completions protocol; Groq (the default deployment target) and
//! OpenAI itself get dedicated constructors. Uses [`async_openai`] for
//! request handling and built-in SSE streaming.

pub mod streaming;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_openai::Client;
use secrecy::{ExposeSecret, SecretString};

use menubot_core::llm::provider::{EventStream, LlmProvider};
use menubot_types::llm::{CompletionRequest, LlmError, MessageRole};

use self::streaming::map_openai_stream;

/// Provider for any OpenAI-compatible chat-completions API.
///
/// Does NOT derive Debug: the API key lives inside the wrapped client
/// and must not leak into logs.
pub struct OpenAiCompatProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
}

impl OpenAiCompatProvider {
    pub fn new(provider_name: &str, base_url: &str, api_key: &SecretString) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(base_url);

        Self {
            client: Client::with_config(config),
            provider_name: provider_name.to_string(),
        }
    }

    /// Groq's OpenAI-compatible endpoint.
    pub fn groq(api_key: &SecretString) -> Self {
        Self::new("groq", "https://api.groq.com/openai/v1", api_key)
    }

    /// Stock OpenAI.
    pub fn openai(api_key: &SecretString) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(ref system) = request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                    name: None,
                },
            ));
        }

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                msg.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(oai_msg);
        }

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            stream: Some(true),
            ..Default::default()
        }
    }
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let oai_request = self.build_request(&request);
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            let oai_stream = client
                .chat()
                .create_stream(oai_request)
                .await
                .map_err(map_openai_error)?;

            let mut inner = map_openai_stream(oai_stream);

            use futures_util::StreamExt;
            while let Some(event) = inner.next().await {
                match event {
                    Ok(ev) => yield ev,
                    Err(e) => Err(e)?,
                }
            }
        })
    }
}

/// Map an `async_openai` error to the domain error taxonomy.
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Invalid API Key")
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_exceeded" {
                LlmError::RateLimited
            } else if error_type == "invalid_request_error"
                || code == "model_not_found"
                || code == "context_length_exceeded"
                || api_err.message.contains("maximum context length")
            {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: api_err.message.clone(),
                }
            }
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        OpenAIError::StreamError(msg) => LlmError::Stream(msg.to_string()),
        OpenAIError::Reqwest(_) => LlmError::Stream(err.to_string()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menubot_types::llm::Message;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::groq(&SecretString::from("test-key"))
    }

    #[test]
    fn test_build_request_prepends_system() {
        let request = CompletionRequest {
            model: "llama-3.3-70b-versatile".to_string(),
            messages: vec![Message::user("Hi"), Message::assistant("Hello!")],
            system: Some("You are a test bot.".to_string()),
            max_tokens: 256,
            temperature: Some(0.2),
            stream: true,
        };

        let oai = provider().build_request(&request);
        assert_eq!(oai.model, "llama-3.3-70b-versatile");
        assert_eq!(oai.messages.len(), 3);
        assert!(matches!(
            oai.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            oai.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            oai.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert_eq!(oai.stream, Some(true));
        assert_eq!(oai.max_completion_tokens, Some(256));
    }

    #[test]
    fn test_map_openai_error_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("authentication_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_map_openai_error_unknown_model_is_permanent() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "The model `nope-9000` does not exist".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("model_not_found".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_map_openai_error_context_length_is_permanent() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "This model's maximum context length is 8192 tokens".to_string(),
            r#type: None,
            param: None,
            code: Some("context_length_exceeded".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn test_map_openai_error_server_error_is_transient() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "The server had an error processing your request".to_string(),
            r#type: Some("server_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::Provider { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(provider().name(), "groq");
        assert_eq!(
            OpenAiCompatProvider::openai(&SecretString::from("k")).name(),
            "openai"
        );
    }
}
