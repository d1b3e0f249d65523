//! Demonstration run
//!
//! Smoke test first; if it passes, the marketing and document pipelines run
//! one after another. A failed pipeline is reported and the next one still
//! runs. Nothing here turns a failure into a process error.

use std::sync::Arc;

use relay_core::{CompletionProvider, Pipeline, RelayObserver, SequentialRelay};

use crate::console;
use crate::pipelines;

/// How one pipeline ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    Failed,
}

/// What happened during a demonstration run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoReport {
    pub smoke_test_passed: bool,
    /// `None` when the smoke test failed and the pipeline never ran
    pub marketing: Option<PipelineOutcome>,
    pub document: Option<PipelineOutcome>,
}

impl DemoReport {
    pub const fn aborted() -> Self {
        Self {
            smoke_test_passed: false,
            marketing: None,
            document: None,
        }
    }
}

pub struct Demo {
    provider: Arc<dyn CompletionProvider>,
    relay: SequentialRelay,
}

impl Demo {
    pub fn new(provider: Arc<dyn CompletionProvider>, observer: Arc<dyn RelayObserver>) -> Self {
        Self {
            provider,
            relay: SequentialRelay::with_observer(observer),
        }
    }

    pub async fn run(&self) -> DemoReport {
        if !self.smoke_test().await {
            println!("❌ Single agent test failed. Cannot proceed.");
            return DemoReport::aborted();
        }

        let marketing = self.run_marketing().await;
        let document = self.run_document().await;

        DemoReport {
            smoke_test_passed: true,
            marketing: Some(marketing),
            document: Some(document),
        }
    }

    /// Ask the test agent one question to confirm the provider works
    pub async fn smoke_test(&self) -> bool {
        println!("🧪 Testing Single Agent...");
        console::rule();

        let agent = pipelines::test_agent(self.provider.clone());
        match agent.respond(pipelines::TEST_QUESTION).await {
            Ok(answer) => {
                println!("✅ Test Response: {answer}");
                println!("🎉 Single agent test successful!");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, retryable = e.is_retryable(), "Smoke test failed");
                println!("❌ Test failed: {e}");
                false
            }
        }
    }

    pub async fn run_marketing(&self) -> PipelineOutcome {
        console::section("📈 Marketing Pipeline Example");
        self.run_pipeline(
            pipelines::marketing(&self.provider),
            pipelines::PRODUCT_DESCRIPTION,
            "🎉 FINAL MARKETING COPY:",
            "❌ Error in main pipeline",
        )
        .await
    }

    pub async fn run_document(&self) -> PipelineOutcome {
        console::section("📄 Document Processing Example");
        self.run_pipeline(
            pipelines::document(&self.provider),
            pipelines::DOCUMENT_TEXT,
            "📋 PROCESSED DOCUMENT:",
            "❌ Document processing error",
        )
        .await
    }

    async fn run_pipeline(
        &self,
        pipeline: relay_core::Result<Pipeline>,
        input: &str,
        result_title: &str,
        error_prefix: &str,
    ) -> PipelineOutcome {
        let outcome = match pipeline {
            Ok(pipeline) => pipeline.run(&self.relay, input).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => {
                console::result(result_title, &output);
                PipelineOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "Pipeline failed");
                println!("{error_prefix}: {e}");
                PipelineOutcome::Failed
            }
        }
    }
}
