//! # relay-core
//!
//! Provider-agnostic single-turn agents and the sequential relay that chains them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      SequentialRelay                          │
//! │   input ─▶ Agent₁ ─▶ Agent₂ ─▶ … ─▶ Agentₙ ─▶ output          │
//! │               │         │              │                      │
//! │               └─────────┴──────┬───────┘                      │
//! │                                ▼                              │
//! │                    CompletionProvider (Strategy)              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `CompletionProvider` trait enables swapping the hosted backend
//! (or a deterministic mock) without changing agent or relay logic.

pub mod agent;
pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod relay;

pub use agent::{Agent, AgentBuilder};
pub use error::{ProviderError, ProviderResult, RelayError, Result};
pub use message::{ConversationTurn, Role};
pub use provider::{Completion, CompletionProvider, GenerationOptions, ProviderInfo};
pub use relay::{Pipeline, RelayObserver, RunId, SequentialRelay, Step};
