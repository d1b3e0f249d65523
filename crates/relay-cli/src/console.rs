//! Operator console output
//!
//! Human-readable progress on stdout. Diagnostics go through `tracing`.

use relay_core::{ProviderError, RelayObserver, RunId, Step};

const RULE_WIDTH: usize = 60;
const STEP_RULE_WIDTH: usize = 50;

pub fn rule() {
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Blank line, rule, title, rule
pub fn section(title: &str) {
    println!();
    rule();
    println!("{title}");
    rule();
}

/// Title, rule, body, rule
pub fn result(title: &str, body: &str) {
    println!("{title}");
    rule();
    println!("{body}");
    rule();
}

/// Prints every step of a relay run as it happens
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleObserver;

impl RelayObserver for ConsoleObserver {
    fn on_run_started(&self, _run_id: RunId, input: &str) {
        println!("🚀 Starting with input: {input}\n");
    }

    fn on_step_started(&self, step: Step<'_>) {
        println!("🤖 Step {}: {}", step.index, step.agent);
        println!("{}", "-".repeat(STEP_RULE_WIDTH));
    }

    fn on_step_completed(&self, _step: Step<'_>, output: &str) {
        println!("{output}");
        println!("{}", "-".repeat(STEP_RULE_WIDTH));
        println!();
    }

    fn on_step_failed(&self, step: Step<'_>, error: &ProviderError) {
        println!("❌ {} failed: {}", step.agent, error.user_message());
        println!("{}", "-".repeat(STEP_RULE_WIDTH));
        println!();
    }
}
