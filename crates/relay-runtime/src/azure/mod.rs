//! Azure OpenAI Completion Provider
//!
//! Implementation of `CompletionProvider` for an Azure OpenAI chat deployment.

mod sse;
mod wire;

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::RETRY_AFTER;

use relay_core::{
    error::{ProviderError, ProviderResult},
    message::ConversationTurn,
    provider::{Completion, CompletionProvider, GenerationOptions, ProviderInfo, ResponseStream},
};

use self::wire::{ChatRequest, ChatResponse};

pub const DEFAULT_API_VERSION: &str = "2024-06-01";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// How responses are read from the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// One JSON body holding every choice
    #[default]
    Whole,
    /// Server-sent events, assembled into choices as they finish
    Streaming,
}

/// Azure OpenAI provider configuration
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,

    /// Resource key sent in the `api-key` header
    pub api_key: String,

    /// Chat model deployment name
    pub deployment_id: String,

    /// REST API version query parameter
    pub api_version: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    pub response_mode: ResponseMode,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment_id: String::new(),
            api_version: DEFAULT_API_VERSION.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            response_mode: ResponseMode::Whole,
        }
    }
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment_id", &self.deployment_id)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("response_mode", &self.response_mode)
            .finish()
    }
}

impl AzureOpenAiConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment_id: deployment_id.into(),
            ..Default::default()
        }
    }

    /// Read the configuration from the environment
    pub fn from_env() -> Self {
        Self::from_env_or(Self::default())
    }

    /// Override `defaults` with whichever `AZURE_OPENAI_*` variables are set.
    pub fn from_env_or(defaults: Self) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            endpoint: var("AZURE_OPENAI_ENDPOINT").unwrap_or(defaults.endpoint),
            api_key: var("AZURE_OPENAI_API_KEY").unwrap_or(defaults.api_key),
            deployment_id: var("AZURE_OPENAI_DEPLOYMENT").unwrap_or(defaults.deployment_id),
            api_version: var("AZURE_OPENAI_API_VERSION").unwrap_or(defaults.api_version),
            timeout_secs: var("AZURE_OPENAI_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            response_mode: var("AZURE_OPENAI_STREAM")
                .map_or(defaults.response_mode, |v| parse_response_mode(&v)),
        }
    }

    pub fn with_response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check that every field needed for a request is present
    pub fn validate(&self) -> ProviderResult<()> {
        let missing: Vec<&str> = [
            ("endpoint", &self.endpoint),
            ("api key", &self.api_key),
            ("deployment", &self.deployment_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Config(format!(
                "missing Azure OpenAI {}",
                missing.join(", ")
            )))
        }
    }

    /// Full `chat/completions` URL for the configured deployment
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment_id,
            self.api_version
        )
    }
}

fn parse_response_mode(value: &str) -> ResponseMode {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "stream" | "streaming" => ResponseMode::Streaming,
        _ => ResponseMode::Whole,
    }
}

/// Map a non-success status and its body to a provider error
fn status_error(status: u16, retry_after_secs: Option<u64>, body: &str) -> ProviderError {
    let message = wire::error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body.chars().take(512).collect()
        }
    });

    match status {
        401 | 403 => ProviderError::Auth(message),
        429 => ProviderError::RateLimited {
            message,
            retry_after_secs,
        },
        _ => ProviderError::Api { status, message },
    }
}

/// Azure OpenAI chat-completion provider
pub struct AzureOpenAiProvider {
    client: reqwest::Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiProvider {
    /// Create from configuration. Fails if required fields are missing.
    pub fn from_config(config: AzureOpenAiConfig) -> ProviderResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> ProviderResult<Self> {
        Self::from_config(AzureOpenAiConfig::from_env())
    }

    pub const fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }

    fn transport_error(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout_secs)
        } else {
            ProviderError::Network(err.to_string())
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> ProviderResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response.text().await.unwrap_or_default();
        let err = status_error(status.as_u16(), retry_after, &body);

        tracing::warn!(
            deployment = %self.config.deployment_id,
            status = status.as_u16(),
            error = %err,
            "Azure OpenAI request rejected"
        );
        Err(err)
    }

    /// Every choice of a whole response, in index order
    fn whole_responses(&self, body: ChatResponse) -> ResponseStream {
        let model = body
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.config.deployment_id.clone());
        let usage = body.usage;

        let mut choices = body.choices;
        choices.sort_by_key(|c| c.index);

        let items: Vec<ProviderResult<Completion>> = choices
            .into_iter()
            .map(|choice| -> ProviderResult<Completion> {
                let content = choice
                    .message
                    .and_then(|m| m.content)
                    .ok_or(ProviderError::EmptyResponse)?;
                Ok(Completion {
                    content,
                    model: model.clone(),
                    usage,
                    finish_reason: choice.finish_reason,
                })
            })
            .collect();

        Box::pin(futures::stream::iter(items))
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Azure OpenAI".into(),
            model: self.config.deployment_id.clone(),
            supports_streaming: self.config.response_mode == ResponseMode::Streaming,
        }
    }

    async fn invoke(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> ProviderResult<ResponseStream> {
        let streaming = self.config.response_mode == ResponseMode::Streaming;
        let request = ChatRequest {
            messages: turns,
            stream: streaming,
            options,
        };

        tracing::debug!(
            deployment = %self.config.deployment_id,
            turns = turns.len(),
            streaming,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.config.chat_completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let response = self.check_status(response).await?;

        if streaming {
            let timeout_secs = self.config.timeout_secs;
            let events = response.bytes_stream().eventsource().map(move |event| {
                event.map(|e| e.data).map_err(|e| match e {
                    eventsource_stream::EventStreamError::Transport(err) if err.is_timeout() => {
                        ProviderError::Timeout(timeout_secs)
                    }
                    other => ProviderError::Network(other.to_string()),
                })
            });
            return Ok(sse::assemble(events, self.config.deployment_id.clone()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let body: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if let Some(usage) = &body.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        Ok(self.whole_responses(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::message::conversation_for;
    use relay_core::provider::FinishReason;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEPLOYMENT_PATH: &str = "/openai/deployments/gpt-test/chat/completions";

    fn config_for(server: &MockServer) -> AzureOpenAiConfig {
        AzureOpenAiConfig::new(server.uri(), "secret", "gpt-test")
    }

    fn provider_for(server: &MockServer) -> AzureOpenAiProvider {
        AzureOpenAiProvider::from_config(config_for(server)).unwrap()
    }

    async fn complete(provider: &AzureOpenAiProvider) -> ProviderResult<Completion> {
        provider
            .complete(&conversation_for("up", "hello"), &GenerationOptions::default())
            .await
    }

    #[test]
    fn test_config_defaults() {
        let config = AzureOpenAiConfig::default();
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.response_mode, ResponseMode::Whole);
        assert!(matches!(config.validate(), Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_validate_names_missing_fields() {
        let config = AzureOpenAiConfig::new("https://x.openai.azure.com", "", " ");
        let Err(ProviderError::Config(msg)) = config.validate() else {
            panic!("expected config error");
        };
        assert_eq!(msg, "missing Azure OpenAI api key, deployment");
    }

    #[test]
    fn test_url_and_redacted_debug() {
        let config = AzureOpenAiConfig::new("https://x.openai.azure.com/", "k3y", "gpt-4o");
        assert_eq!(
            config.chat_completions_url(),
            "https://x.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
        assert!(!format!("{config:?}").contains("k3y"));
    }

    #[test]
    fn test_parse_response_mode() {
        assert_eq!(parse_response_mode("true"), ResponseMode::Streaming);
        assert_eq!(parse_response_mode(" Stream "), ResponseMode::Streaming);
        assert_eq!(parse_response_mode("0"), ResponseMode::Whole);
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(status_error(401, None, ""), ProviderError::Auth(_)));
        assert!(matches!(status_error(403, None, ""), ProviderError::Auth(_)));
        assert!(matches!(
            status_error(429, Some(3), ""),
            ProviderError::RateLimited {
                retry_after_secs: Some(3),
                ..
            }
        ));
        let ProviderError::Api { status, message } = status_error(502, None, "") else {
            panic!("expected api error");
        };
        assert_eq!(status, 502);
        assert_eq!(message, "HTTP 502");
    }

    #[tokio::test]
    async fn test_whole_response_returns_first_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .and(query_param("api-version", DEFAULT_API_VERSION))
            .and(header("api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "system", "content": "up"},
                    {"role": "user", "content": "hello"}
                ],
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-2024-05-13",
                "choices": [
                    {"index": 1, "message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"},
                    {"index": 0, "message": {"role": "assistant", "content": " first\n"}, "finish_reason": "stop"}
                ],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = complete(&provider_for(&server)).await.unwrap();
        assert_eq!(completion.content, " first\n");
        assert_eq!(completion.model, "gpt-4o-2024-05-13");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.map(|u| u.total_tokens), Some(15));
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let result = complete(&provider_for(&server)).await;
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"code": "401", "message": "Access denied due to invalid subscription key."}
            })))
            .mount(&server)
            .await;

        let err = complete(&provider_for(&server)).await.unwrap_err();
        let ProviderError::Auth(message) = err else {
            panic!("expected auth error");
        };
        assert_eq!(message, "Access denied due to invalid subscription key.");
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let err = complete(&provider_for(&server)).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_secs: Some(7),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = complete(&provider_for(&server)).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Api { status: 500, ref message } if message == "upstream exploded"
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = complete(&provider_for(&server)).await;
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let provider =
            AzureOpenAiProvider::from_config(config_for(&server).with_timeout(1)).unwrap();
        let result = complete(&provider).await;
        assert!(matches!(result, Err(ProviderError::Timeout(1))));
    }

    #[tokio::test]
    async fn test_streaming_takes_first_finished_choice() {
        let server = MockServer::start().await;
        let body = [
            r#"{"choices":[],"prompt_filter_results":[{"prompt_index":0}]}"#,
            r#"{"model":"gpt-4o","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#,
            r#"{"model":"gpt-4o","choices":[{"index":0,"delta":{"content":"4"},"finish_reason":null}]}"#,
            r#"{"model":"gpt-4o","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            "[DONE]",
        ]
        .iter()
        .map(|data| format!("data: {data}\n\n"))
        .collect::<String>();

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider = AzureOpenAiProvider::from_config(
            config_for(&server).with_response_mode(ResponseMode::Streaming),
        )
        .unwrap();
        assert!(provider.info().supports_streaming);

        let completion = complete(&provider).await.unwrap();
        assert_eq!(completion.content, "4");
        assert_eq!(completion.model, "gpt-4o");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let config = AzureOpenAiConfig::new("http://127.0.0.1:9", "secret", "gpt-test");
        let provider = AzureOpenAiProvider::from_config(config).unwrap();
        let result = complete(&provider).await;
        assert!(matches!(result, Err(ProviderError::Network(_))));
    }
}
