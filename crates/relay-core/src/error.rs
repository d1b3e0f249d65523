//! Error Types

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for completion provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Failure of a single completion request.
///
/// This is one broad error kind: callers abort the current step on any
/// variant. The variants only classify the cause for logging.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Credentials rejected by the backend
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Backend throttled the request
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Transport-level failure (DNS, connect, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not finish within the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-success status not covered above
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Body could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Backend answered but produced no response text
    #[error("Backend produced no response")]
    EmptyResponse,

    /// Conversation violates the request preconditions
    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    /// Provider is missing endpoint, key or deployment
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed. Nothing in the relay retries;
    /// this is reported alongside the failure.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_)
        ) || matches!(self, Self::Api { status, .. } if *status >= 500)
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            Self::RateLimited { .. } => {
                "The AI service is rate limiting requests. Please wait a moment.".into()
            }
            Self::Network(_) | Self::Timeout(_) => {
                "The AI service is currently unreachable. Please try again.".into()
            }
            Self::Api { status, message } => {
                format!("The AI service returned an error ({status}): {message}")
            }
            Self::MalformedResponse(_) | Self::EmptyResponse => {
                "The AI service returned an unusable response.".into()
            }
            Self::InvalidConversation(msg) => format!("Invalid request: {msg}"),
            Self::Config(msg) => format!("The AI service is not configured: {msg}"),
        }
    }
}

/// Relay and pipeline errors
#[derive(Error, Debug)]
pub enum RelayError {
    /// A relay needs at least one agent
    #[error("Pipeline has no agents")]
    EmptyPipeline,

    /// Agent names must be unique within one pipeline
    #[error("Duplicate agent name in pipeline: {0}")]
    DuplicateAgent(String),

    /// An agent's turn failed; later steps were not run
    #[error("Step {step} ({agent}) failed: {source}")]
    Step {
        step: usize,
        agent: String,
        #[source]
        source: ProviderError,
    },

    /// Invalid agent or pipeline construction
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// The provider failure behind this error, if any
    pub const fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}
