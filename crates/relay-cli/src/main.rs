//! agent-relay
//!
//! Runs a smoke test against the configured Azure OpenAI deployment, then the
//! marketing relay (Analyst → Copywriter → Editor) and the document relay
//! (Summarizer → Translator).
//!
//! Failures are printed and logged; the process always exits successfully.

mod app;
mod console;
mod pipelines;
mod settings;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_core::CompletionProvider;
use relay_runtime::AzureOpenAiProvider;

use crate::app::{Demo, DemoReport};
use crate::console::ConsoleObserver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    println!("🌟 Sequential Agent Relay");
    println!("✅ Using Azure OpenAI chat completions");
    console::rule();

    let config = settings::azure_config();
    tracing::info!(
        endpoint = %config.endpoint,
        deployment = %config.deployment_id,
        mode = ?config.response_mode,
        "Provider configured"
    );

    let report = match AzureOpenAiProvider::from_config(config) {
        Ok(provider) => {
            let provider: Arc<dyn CompletionProvider> = Arc::new(provider);
            Demo::new(provider, Arc::new(ConsoleObserver)).run().await
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not create provider");
            println!("❌ Test failed: {}", e.user_message());
            println!("❌ Single agent test failed. Cannot proceed.");
            DemoReport::aborted()
        }
    };

    tracing::info!(
        smoke_test = report.smoke_test_passed,
        marketing = ?report.marketing,
        document = ?report.document,
        "Demo finished"
    );
    Ok(())
}
