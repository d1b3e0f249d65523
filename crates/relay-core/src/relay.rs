//! Sequential Relay
//!
//! Threads a text through an ordered list of agents. Each agent consumes the
//! previous agent's output, so steps run strictly one after another. The
//! first failing step aborts the run; no partial result is returned.
//!
//! ```text
//! initial ─▶ Agent₁ ─▶ Agent₂ ─▶ … ─▶ Agentₙ ─▶ final
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::Agent;
use crate::error::{ProviderError, RelayError, Result};

/// Identifier for one relay run, used to correlate log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of the agent currently running. `index` is 1-based.
#[derive(Clone, Copy, Debug)]
pub struct Step<'a> {
    pub run_id: RunId,
    pub index: usize,
    pub total: usize,
    pub agent: &'a str,
}

/// Progress callbacks for a relay run.
///
/// The relay keeps no intermediate outputs; observers are where callers
/// print or collect them. All methods default to doing nothing.
pub trait RelayObserver: Send + Sync {
    fn on_run_started(&self, _run_id: RunId, _input: &str) {}

    fn on_step_started(&self, _step: Step<'_>) {}

    fn on_step_completed(&self, _step: Step<'_>, _output: &str) {}

    fn on_step_failed(&self, _step: Step<'_>, _error: &ProviderError) {}

    fn on_run_completed(&self, _run_id: RunId, _output: &str) {}
}

/// Observer that ignores every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RelayObserver for NoopObserver {}

/// Runs agents in list order, feeding each output to the next agent
#[derive(Clone)]
pub struct SequentialRelay {
    observer: Arc<dyn RelayObserver>,
}

impl Default for SequentialRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialRelay {
    pub fn new() -> Self {
        Self {
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(observer: Arc<dyn RelayObserver>) -> Self {
        Self { observer }
    }

    /// Run `agents` in order starting from `initial_text`, returning the
    /// last agent's output.
    pub async fn run(&self, agents: &[Agent], initial_text: &str) -> Result<String> {
        if agents.is_empty() {
            return Err(RelayError::EmptyPipeline);
        }

        let run_id = RunId::new();
        let span = tracing::info_span!("relay", %run_id, agents = agents.len());

        self.run_steps(run_id, agents, initial_text)
            .instrument(span)
            .await
    }

    async fn run_steps(&self, run_id: RunId, agents: &[Agent], initial_text: &str) -> Result<String> {
        let total = agents.len();
        self.observer.on_run_started(run_id, initial_text);

        let mut current = initial_text.to_owned();

        for (i, agent) in agents.iter().enumerate() {
            let step = Step {
                run_id,
                index: i + 1,
                total,
                agent: agent.name(),
            };

            tracing::info!(step = step.index, agent = %agent.name(), "Running step");
            self.observer.on_step_started(step);

            match agent.respond(&current).await {
                Ok(output) => {
                    self.observer.on_step_completed(step, &output);
                    current = output;
                }
                Err(source) => {
                    tracing::warn!(
                        step = step.index,
                        agent = %agent.name(),
                        retryable = source.is_retryable(),
                        error = %source,
                        "Step failed, aborting run"
                    );
                    self.observer.on_step_failed(step, &source);
                    return Err(RelayError::Step {
                        step: step.index,
                        agent: agent.name().to_owned(),
                        source,
                    });
                }
            }
        }

        tracing::info!(output_len = current.len(), "Relay completed");
        self.observer.on_run_completed(run_id, &current);

        Ok(current)
    }
}

/// A named, validated list of agents
#[derive(Clone, Debug)]
pub struct Pipeline {
    name: String,
    agents: Vec<Agent>,
}

impl Pipeline {
    /// Create a pipeline. Rejects an empty agent list and duplicate names.
    pub fn new(name: impl Into<String>, agents: Vec<Agent>) -> Result<Self> {
        if agents.is_empty() {
            return Err(RelayError::EmptyPipeline);
        }

        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.name()) {
                return Err(RelayError::DuplicateAgent(agent.name().to_owned()));
            }
        }

        Ok(Self {
            name: name.into(),
            agents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Run every agent of this pipeline through `relay`
    pub async fn run(&self, relay: &SequentialRelay, input: &str) -> Result<String> {
        tracing::info!(pipeline = %self.name, "Starting pipeline");
        relay.run(&self.agents, input).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::mock::{EchoProvider, FailingProvider, FixedProvider, RecordingProvider};

    fn echo_agent(name: &str, instructions: &str) -> Agent {
        Agent::new(name, instructions, Arc::new(EchoProvider))
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl EventLog {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl RelayObserver for EventLog {
        fn on_run_started(&self, _run_id: RunId, input: &str) {
            self.push(format!("start:{input}"));
        }

        fn on_step_started(&self, step: Step<'_>) {
            self.push(format!("step:{}/{}:{}", step.index, step.total, step.agent));
        }

        fn on_step_completed(&self, step: Step<'_>, output: &str) {
            self.push(format!("done:{}:{output}", step.agent));
        }

        fn on_step_failed(&self, step: Step<'_>, _error: &ProviderError) {
            self.push(format!("failed:{}", step.agent));
        }

        fn on_run_completed(&self, _run_id: RunId, output: &str) {
            self.push(format!("end:{output}"));
        }
    }

    #[tokio::test]
    async fn test_two_agents_thread_output() {
        let agents = vec![echo_agent("A", "up"), echo_agent("B", "down")];
        let result = SequentialRelay::new().run(&agents, "hello").await.unwrap();
        assert_eq!(result, "down|up|hello");
    }

    #[tokio::test]
    async fn test_single_agent_equals_respond() {
        let agent = echo_agent("A", "solo");
        let direct = agent.respond("x").await.unwrap();
        let relayed = SequentialRelay::new()
            .run(std::slice::from_ref(&agent), "x")
            .await
            .unwrap();
        assert_eq!(relayed, direct);
    }

    #[tokio::test]
    async fn test_each_agent_called_once_in_order() {
        let provider = Arc::new(RecordingProvider::new(EchoProvider));
        let agents: Vec<_> = ["first", "second", "third"]
            .iter()
            .map(|name| Agent::new(*name, *name, provider.clone()))
            .collect();

        let result = SequentialRelay::new().run(&agents, "seed").await.unwrap();
        assert_eq!(result, "third|second|first|seed");

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        let order: Vec<_> = requests.iter().map(|r| r[0].text.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
        assert_eq!(requests[1][1].text, "first|seed");
        assert_eq!(requests[2][1].text, "second|first|seed");
    }

    #[tokio::test]
    async fn test_failure_stops_later_agents() {
        let provider = Arc::new(RecordingProvider::new(FailingProvider::when_instructed(
            "broken",
        )));
        let agents = vec![
            Agent::new("A", "ok", provider.clone()),
            Agent::new("B", "broken", provider.clone()),
            Agent::new("C", "never", provider.clone()),
        ];

        let err = SequentialRelay::new().run(&agents, "in").await.unwrap_err();
        match err {
            RelayError::Step { step, agent, source } => {
                assert_eq!(step, 2);
                assert_eq!(agent, "B");
                assert!(matches!(source, ProviderError::Network(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_agent_list_rejected() {
        let result = SequentialRelay::new().run(&[], "unchanged").await;
        assert!(matches!(result, Err(RelayError::EmptyPipeline)));
    }

    #[tokio::test]
    async fn test_rerun_is_deterministic_with_fixed_provider() {
        let provider = Arc::new(RecordingProvider::new(FixedProvider::new("same")));
        let agents = vec![
            Agent::new("A", "a", provider.clone()),
            Agent::new("B", "b", provider.clone()),
        ];
        let relay = SequentialRelay::new();

        let first = relay.run(&agents, "input").await.unwrap();
        let second = relay.run(&agents, "input").await.unwrap();
        assert_eq!(first, "same");
        assert_eq!(first, second);
        // No memoization: both runs hit the provider
        assert_eq!(provider.request_count(), 4);
    }

    #[tokio::test]
    async fn test_observer_sees_every_step() {
        let log = Arc::new(EventLog::default());
        let relay = SequentialRelay::with_observer(log.clone());
        let agents = vec![echo_agent("A", "up"), echo_agent("B", "down")];

        relay.run(&agents, "hi").await.unwrap();

        assert_eq!(
            log.events(),
            vec![
                "start:hi",
                "step:1/2:A",
                "done:A:up|hi",
                "step:2/2:B",
                "done:B:down|up|hi",
                "end:down|up|hi",
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_failure_without_completion() {
        let log = Arc::new(EventLog::default());
        let relay = SequentialRelay::with_observer(log.clone());
        let agents = vec![Agent::new("A", "x", Arc::new(FailingProvider::always()))];

        assert!(relay.run(&agents, "hi").await.is_err());
        assert_eq!(log.events(), vec!["start:hi", "step:1/1:A", "failed:A"]);
    }

    #[test]
    fn test_pipeline_validation() {
        assert!(matches!(
            Pipeline::new("empty", Vec::new()),
            Err(RelayError::EmptyPipeline)
        ));
        let dup = Pipeline::new("dup", vec![echo_agent("A", "x"), echo_agent("A", "y")]);
        assert!(matches!(dup, Err(RelayError::DuplicateAgent(name)) if name == "A"));

        let ok = Pipeline::new("ok", vec![echo_agent("A", "x"), echo_agent("B", "y")]).unwrap();
        assert_eq!(ok.name(), "ok");
        assert_eq!(ok.len(), 2);
        assert!(!ok.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_run() {
        let pipeline =
            Pipeline::new("doc", vec![echo_agent("Summarizer", "sum"), echo_agent("Translator", "es")])
                .unwrap();
        let out = pipeline.run(&SequentialRelay::new(), "text").await.unwrap();
        assert_eq!(out, "es|sum|text");
    }
}
