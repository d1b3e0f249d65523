//! Completion Provider Strategy Pattern
//!
//! Defines the one capability agents need from a hosted chat-completion
//! backend: turn a short conversation into response text.
//!
//! A backend may produce several responses for one request (multiple
//! choices, or a stream that keeps going after the first message is done).
//! Providers expose them lazily through [`CompletionProvider::invoke`];
//! [`CompletionProvider::complete`] keeps only the first one and drops the
//! rest of the stream without draining it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_core::provider::{CompletionProvider, GenerationOptions};
//!
//! let provider = AzureOpenAiProvider::from_config(config)?;
//! let completion = provider.complete(&turns, &GenerationOptions::default()).await?;
//! ```

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};
use crate::message::{ConversationTurn, validate_turns};

/// Per-request generation settings. Unset fields are left to the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Top-p nucleus sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Number of responses to request
    #[serde(default, rename = "n", skip_serializing_if = "Option::is_none")]
    pub choices: Option<u8>,
}

/// One complete response from the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model or deployment that produced it
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// A plain text completion with no metadata
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    #[serde(other)]
    Other,
}

/// Lazy sequence of complete responses for one request
pub type ResponseStream = Pin<Box<dyn Stream<Item = ProviderResult<Completion>> + Send>>;

/// Provider metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "Azure OpenAI")
    pub name: String,

    /// Model or deployment requests are routed to
    pub model: String,

    /// Whether responses are read from a server-sent event stream
    pub supports_streaming: bool,
}

/// Strategy trait for completion backends
///
/// Implement this trait to add support for new backends.
/// Agents work exclusively through this interface.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get provider information
    fn info(&self) -> ProviderInfo;

    /// Send one request and return the responses it produces, lazily.
    async fn invoke(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> ProviderResult<ResponseStream>;

    /// Send one request and return only its first response.
    async fn complete(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> ProviderResult<Completion> {
        validate_turns(turns)?;
        let responses = self.invoke(turns, options).await?;
        first_response(responses).await
    }
}

/// Take the first response of a stream and release the remainder.
pub async fn first_response(mut responses: ResponseStream) -> ProviderResult<Completion> {
    let first = responses.next().await;
    drop(responses);
    first.unwrap_or(Err(ProviderError::EmptyResponse))
}
