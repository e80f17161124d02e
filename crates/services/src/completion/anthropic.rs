use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tutor_core::model::{ChatMessage, ChatRole};
use url::Url;

use super::{CompletionClient, CompletionRequest};
use crate::error::CompletionError;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AnthropicConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read the config from `TUTOR_AI_*` variables.
    ///
    /// Returns `None` when no API key is set (`TUTOR_AI_API_KEY`, falling back
    /// to `ANTHROPIC_API_KEY`).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("TUTOR_AI_API_KEY")
            .or_else(|_| env::var("ANTHROPIC_API_KEY"))
            .ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        let mut config = Self::new(api_key.trim());
        if let Ok(base_url) = env::var("TUTOR_AI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = env::var("TUTOR_AI_MODEL") {
            config.model = model;
        }
        if let Some(max_tokens) = env::var("TUTOR_AI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.max_tokens = max_tokens;
        }
        if let Some(secs) = env::var("TUTOR_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

/// `CompletionClient` backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
    endpoint: Url,
}

impl AnthropicClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::InvalidConfig` for an unusable base URL, key or
    /// token budget, and `CompletionError::Http` if the HTTP client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::Disabled);
        }
        if config.max_tokens == 0 {
            return Err(CompletionError::InvalidConfig(
                "max_tokens must be positive".into(),
            ));
        }
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| CompletionError::InvalidConfig(format!("base url: {e}")))?;
        let endpoint = Url::parse(&format!("{}/v1/messages", base.as_str().trim_end_matches('/')))
            .map_err(|e| CompletionError::InvalidConfig(format!("base url: {e}")))?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let payload = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: &request.system,
            messages: request.messages.iter().map(WireMessage::from).collect(),
        };

        tracing::debug!(
            model = %self.config.model,
            messages = payload.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "completion request rejected");
            return Err(CompletionError::HttpStatus(response.status()));
        }

        let body: MessagesResponse = response.json().await?;
        let text = body
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        Self {
            role,
            content: &message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Option<(HeaderMap, serde_json::Value)>>>;

    async fn spawn_stub(status: StatusCode, reply: serde_json::Value, captured: Captured) -> String {
        let app = Router::new().route(
            "/v1/messages",
            post(move |headers: HeaderMap, axum::Json(body): axum::Json<serde_json::Value>| {
                let captured = Arc::clone(&captured);
                let reply = reply.clone();
                async move {
                    *captured.lock().unwrap() = Some((headers, body));
                    (status, axum::Json(reply))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> AnthropicClient {
        let mut config = AnthropicConfig::new("test-key");
        config.base_url = base_url;
        config.max_tokens = 256;
        AnthropicClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn sends_messages_request_and_extracts_text() {
        let captured: Captured = Arc::default();
        let base = spawn_stub(
            StatusCode::OK,
            serde_json::json!({
                "content": [{ "type": "text", "text": "  What do you notice first?  " }]
            }),
            Arc::clone(&captured),
        )
        .await;

        let client = client_for(base);
        let reply = client
            .complete(CompletionRequest::new(
                "be socratic",
                vec![
                    ChatMessage::user("2x + 5 = 13"),
                    ChatMessage::assistant("What is your first step?"),
                    ChatMessage::user("subtract 5"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(reply, "What do you notice first?");

        let (headers, body) = captured.lock().unwrap().take().expect("request captured");
        assert_eq!(headers["x-api-key"], "test-key");
        assert_eq!(headers["anthropic-version"], API_VERSION);
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["system"], "be socratic");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "subtract 5");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let base = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({ "error": { "type": "rate_limit_error" } }),
            Arc::default(),
        )
        .await;

        let err = client_for(base)
            .complete(CompletionRequest::single("s", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::HttpStatus(status) if status == StatusCode::TOO_MANY_REQUESTS
        ));
    }

    #[tokio::test]
    async fn reply_without_text_block_is_empty_response() {
        let base = spawn_stub(
            StatusCode::OK,
            serde_json::json!({ "content": [{ "type": "tool_use", "id": "x" }] }),
            Arc::default(),
        )
        .await;

        let err = client_for(base)
            .complete(CompletionRequest::single("s", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::EmptyResponse));
    }

    #[test]
    fn rejects_blank_key_and_bad_base_url() {
        assert!(matches!(
            AnthropicClient::new(AnthropicConfig::new("  ")),
            Err(CompletionError::Disabled)
        ));

        let mut config = AnthropicConfig::new("k");
        config.base_url = "not a url".into();
        assert!(matches!(
            AnthropicClient::new(config),
            Err(CompletionError::InvalidConfig(_))
        ));
    }
}
