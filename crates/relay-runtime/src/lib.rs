//! # relay-runtime
//!
//! Hosted completion providers for agent-relay.
//!
//! ## Providers
//!
//! - **Azure OpenAI** (default): chat deployments over the Azure REST API,
//!   read either as one JSON body or as a server-sent event stream
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_runtime::{AzureOpenAiConfig, AzureOpenAiProvider};
//!
//! let config = AzureOpenAiConfig::new("https://my-resource.openai.azure.com", key, "gpt-4o");
//! let provider = Arc::new(AzureOpenAiProvider::from_config(config)?);
//! let agent = Agent::new("Editor", "Polish the draft.", provider);
//! ```

#[cfg(feature = "azure")]
pub mod azure;

#[cfg(feature = "azure")]
pub use azure::{AzureOpenAiConfig, AzureOpenAiProvider, ResponseMode};

// Re-export core types for convenience
pub use relay_core::{
    Agent, CompletionProvider, ConversationTurn, Pipeline, ProviderError, RelayError, Result,
    Role, SequentialRelay,
};
