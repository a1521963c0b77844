use futures::future::{join_all, BoxFuture};
use tracing::{info, warn};

use crate::gateway::GatewayResult;

/// One independent side effect of a workflow.
pub struct Step<'a> {
    name: String,
    fut: BoxFuture<'a, GatewayResult<()>>,
}

impl<'a> Step<'a> {
    pub fn new(name: impl Into<String>, fut: BoxFuture<'a, GatewayResult<()>>) -> Self {
        Self {
            name: name.into(),
            fut,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl Outcome {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    pub fn absorb(&mut self, other: Outcome) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    pub fn record<T>(&mut self, workflow: &str, card_id: &str, step: &str, result: &GatewayResult<T>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(e) => {
                self.failed += 1;
                warn!(workflow, card_id, step, error = %e, "Workflow step failed");
            }
        }
    }

    pub fn log_summary(&self, workflow: &str, card_id: &str) {
        if self.is_clean() {
            info!(workflow, card_id, succeeded = self.succeeded, "Workflow complete");
        } else {
            warn!(
                workflow,
                card_id,
                succeeded = self.succeeded,
                failed = self.failed,
                "Workflow finished with failures; twin pair may need manual repair"
            );
        }
    }
}

/// Runs all steps concurrently. A failing step never cancels its siblings.
pub async fn settle(workflow: &str, card_id: &str, steps: Vec<Step<'_>>) -> Outcome {
    let (names, futs): (Vec<String>, Vec<_>) = steps.into_iter().map(|s| (s.name, s.fut)).unzip();
    let results = join_all(futs).await;

    let mut outcome = Outcome::default();
    for (name, result) in names.iter().zip(&results) {
        outcome.record(workflow, card_id, name, result);
    }
    outcome
}
