//! Single-Turn Agents
//!
//! An agent is a name plus fixed instructions bound to a completion
//! provider. Each call to [`Agent::respond`] sends a fresh two-turn
//! conversation and returns the first response verbatim.

use std::fmt;
use std::sync::Arc;

use crate::error::{ProviderResult, RelayError, Result};
use crate::message::conversation_for;
use crate::provider::{CompletionProvider, GenerationOptions};

/// A named, fixed-instruction text transformer
#[derive(Clone)]
pub struct Agent {
    name: String,
    instructions: String,
    provider: Arc<dyn CompletionProvider>,
    options: GenerationOptions,
}

impl Agent {
    /// Create an agent with default generation options
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            provider,
            options: GenerationOptions::default(),
        }
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Run one turn: instructions as system, `input` as user.
    pub async fn respond(&self, input: &str) -> ProviderResult<String> {
        let turns = conversation_for(&self.instructions, input);

        tracing::debug!(
            agent = %self.name,
            input_len = input.len(),
            "Invoking agent"
        );

        let completion = self.provider.complete(&turns, &self.options).await?;

        tracing::debug!(
            agent = %self.name,
            model = %completion.model,
            output_len = completion.content.len(),
            finish_reason = ?completion.finish_reason,
            "Agent responded"
        );

        Ok(completion.content)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("instructions", &self.instructions)
            .field("provider", &self.provider.info().name)
            .field("options", &self.options)
            .finish()
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    name: Option<String>,
    instructions: String,
    provider: Option<Arc<dyn CompletionProvider>>,
    options: GenerationOptions,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| RelayError::Config("Provider is required".into()))?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| RelayError::Config("Agent name is required".into()))?;

        Ok(Agent {
            name,
            instructions: self.instructions,
            provider,
            options: self.options,
        })
    }
}
