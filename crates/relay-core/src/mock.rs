//! Deterministic providers for development and testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::message::{ConversationTurn, Role, last_user_text};
use crate::provider::{
    Completion, CompletionProvider, GenerationOptions, ProviderInfo, ResponseStream,
};

fn mock_info(name: &str) -> ProviderInfo {
    ProviderInfo {
        name: name.into(),
        model: "mock".into(),
        supports_streaming: false,
    }
}

fn single(completion: Completion) -> ResponseStream {
    Box::pin(futures::stream::iter(vec![Ok(completion)]))
}

fn system_text(turns: &[ConversationTurn]) -> &str {
    turns
        .iter()
        .find(|t| t.role == Role::System)
        .map_or("", |t| t.text.as_str())
}

/// Answers `instructions|last user text`.
#[derive(Clone, Debug, Default)]
pub struct EchoProvider;

#[async_trait]
impl CompletionProvider for EchoProvider {
    fn info(&self) -> ProviderInfo {
        mock_info("echo")
    }

    async fn invoke(
        &self,
        turns: &[ConversationTurn],
        _options: &GenerationOptions,
    ) -> ProviderResult<ResponseStream> {
        let input = last_user_text(turns).unwrap_or_default();
        let text = format!("{}|{}", system_text(turns), input);
        Ok(single(Completion::text(text, "mock")))
    }
}

/// Always answers with the same text.
#[derive(Clone, Debug)]
pub struct FixedProvider {
    responses: Vec<String>,
}

impl FixedProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            responses: vec![text.into()],
        }
    }

    /// Produce several responses per request; only the first should be used.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self { responses }
    }
}

#[async_trait]
impl CompletionProvider for FixedProvider {
    fn info(&self) -> ProviderInfo {
        mock_info("fixed")
    }

    async fn invoke(
        &self,
        _turns: &[ConversationTurn],
        _options: &GenerationOptions,
    ) -> ProviderResult<ResponseStream> {
        let items: Vec<_> = self
            .responses
            .iter()
            .map(|text| Ok(Completion::text(text.clone(), "mock")))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Fails requests whose system instructions match `trigger`, echoes the rest.
///
/// With no trigger, every request fails.
#[derive(Clone, Debug, Default)]
pub struct FailingProvider {
    trigger: Option<String>,
}

impl FailingProvider {
    pub const fn always() -> Self {
        Self { trigger: None }
    }

    pub fn when_instructed(instructions: impl Into<String>) -> Self {
        Self {
            trigger: Some(instructions.into()),
        }
    }
}

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn info(&self) -> ProviderInfo {
        mock_info("failing")
    }

    async fn invoke(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> ProviderResult<ResponseStream> {
        let fails = self
            .trigger
            .as_deref()
            .is_none_or(|trigger| system_text(turns) == trigger);
        if fails {
            return Err(ProviderError::Network("connection refused".into()));
        }
        EchoProvider.invoke(turns, options).await
    }
}

/// Records every request and delegates to an inner provider.
pub struct RecordingProvider<P> {
    inner: P,
    requests: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl<P: CompletionProvider> RecordingProvider<P> {
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every conversation sent so far, in call order
    pub fn requests(&self) -> Vec<Vec<ConversationTurn>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for RecordingProvider<P> {
    fn info(&self) -> ProviderInfo {
        self.inner.info()
    }

    async fn invoke(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> ProviderResult<ResponseStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(turns.to_vec());
        }
        self.inner.invoke(turns, options).await
    }
}
