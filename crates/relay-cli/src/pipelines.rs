//! Agent Catalog
//!
//! The fixed agents and inputs of the demonstration run.

use std::sync::Arc;

use relay_core::{Agent, CompletionProvider, Pipeline, Result};

pub const TEST_AGENT_NAME: &str = "TestAgent";
pub const TEST_AGENT_INSTRUCTIONS: &str =
    "You are a helpful assistant. Answer questions clearly and briefly.";
pub const TEST_QUESTION: &str = "What is 2+2? Just give me the number.";

pub const ANALYST_INSTRUCTIONS: &str = "You are a marketing analyst. Given a product description, identify:
- Key features
- Target audience
- Unique selling points

Provide your analysis in a clear, structured format.";

pub const COPYWRITER_INSTRUCTIONS: &str = "You are a marketing copywriter. Given analysis of features, audience, and USPs,
compose compelling marketing copy (like a newsletter section) that highlights these points.
Output should be around 150 words, engaging and persuasive.";

pub const EDITOR_INSTRUCTIONS: &str = "You are an editor. Given draft copy, correct grammar, improve clarity,
ensure consistent tone, and make it polished. Output the final improved copy.";

pub const SUMMARIZER_INSTRUCTIONS: &str =
    "Summarize the given text in under 100 words, highlighting key points.";

pub const TRANSLATOR_INSTRUCTIONS: &str =
    "Translate the given English text to Spanish, maintaining meaning and tone.";

pub const PRODUCT_DESCRIPTION: &str = "An eco-friendly stainless steel water bottle that keeps drinks cold for 24 hours
and hot for 12 hours. Features leak-proof design, comes in 5 colors, made from 90% recycled materials.";

pub const DOCUMENT_TEXT: &str = "Artificial Intelligence has revolutionized industries by automating complex tasks
and providing intelligent insights. Machine learning analyzes data to identify patterns and predictions.
Natural language processing enables computers to understand human language. These technologies are
applied in healthcare, finance, and transportation.";

/// Single agent used to verify the provider before any pipeline runs
pub fn test_agent(provider: Arc<dyn CompletionProvider>) -> Agent {
    Agent::new(TEST_AGENT_NAME, TEST_AGENT_INSTRUCTIONS, provider)
}

/// Analyst → Copywriter → Editor
pub fn marketing(provider: &Arc<dyn CompletionProvider>) -> Result<Pipeline> {
    Pipeline::new(
        "marketing",
        vec![
            Agent::new("Analyst", ANALYST_INSTRUCTIONS, provider.clone()),
            Agent::new("Copywriter", COPYWRITER_INSTRUCTIONS, provider.clone()),
            Agent::new("Editor", EDITOR_INSTRUCTIONS, provider.clone()),
        ],
    )
}

/// Summarizer → Translator
pub fn document(provider: &Arc<dyn CompletionProvider>) -> Result<Pipeline> {
    Pipeline::new(
        "document",
        vec![
            Agent::new("Summarizer", SUMMARIZER_INSTRUCTIONS, provider.clone()),
            Agent::new("Translator", TRANSLATOR_INSTRUCTIONS, provider.clone()),
        ],
    )
}
