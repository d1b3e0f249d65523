//! Built-in provider settings
//!
//! Literal defaults for the Azure OpenAI connection. Any `AZURE_OPENAI_*`
//! variable (from the environment or a `.env` file) overrides them.

use relay_runtime::azure::{AzureOpenAiConfig, DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS, ResponseMode};

pub const ENDPOINT: &str = "";
pub const API_KEY: &str = "";
pub const DEPLOYMENT_ID: &str = "";

/// Configuration used by the demo run
pub fn azure_config() -> AzureOpenAiConfig {
    let defaults = AzureOpenAiConfig {
        endpoint: ENDPOINT.into(),
        api_key: API_KEY.into(),
        deployment_id: DEPLOYMENT_ID.into(),
        api_version: DEFAULT_API_VERSION.into(),
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        response_mode: ResponseMode::Whole,
    };
    AzureOpenAiConfig::from_env_or(defaults)
}
