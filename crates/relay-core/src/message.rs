//! Conversation Turns
//!
//! Every agent invocation sends a fresh, two-turn conversation. Nothing is
//! carried between agents.

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

/// Role of a conversation turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Agent instructions
    System,
    /// Input text for the agent
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A single role-tagged unit of text sent to the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,

    #[serde(rename = "content")]
    pub text: String,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }
}

/// Build the one-turn conversation for an agent invocation:
/// the instructions as the system turn, then the input as the user turn.
pub fn conversation_for(instructions: &str, input: &str) -> [ConversationTurn; 2] {
    [
        ConversationTurn::system(instructions),
        ConversationTurn::user(input),
    ]
}

/// Check the request preconditions shared by all providers.
pub fn validate_turns(turns: &[ConversationTurn]) -> ProviderResult<()> {
    if turns.is_empty() {
        return Err(ProviderError::InvalidConversation(
            "conversation has no turns".into(),
        ));
    }
    if !turns.iter().any(|t| t.role == Role::User) {
        return Err(ProviderError::InvalidConversation(
            "conversation has no user turn".into(),
        ));
    }
    Ok(())
}

/// Text of the last user turn, if any
pub fn last_user_text(turns: &[ConversationTurn]) -> Option<&str> {
    turns
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| t.text.as_str())
}
