//! Step runner: durable, resumable execution of one unit of work.
//!
//! The engine wraps every node execution in a step. A runner guarantees
//! at-least-once execution and, when a run is re-invoked after partial
//! progress, hands back the recorded output of steps that already
//! completed instead of running them again.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use nodes::NodeError;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The future a step's work produces.
pub type StepFuture = Pin<Box<dyn Future<Output = Result<Value, NodeError>> + Send>>;

/// Re-invocable unit of work. Called once per attempt.
pub type StepWork<'a> = &'a (dyn Fn() -> StepFuture + Send + Sync);

#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Run `work` as step `step_id` of run `run_id`, or replay its
    /// recorded output if that step already completed.
    async fn run(&self, run_id: &str, step_id: &str, work: StepWork<'_>) -> Result<Value, NodeError>;

    /// The run will not be re-invoked; recorded outputs may be released.
    async fn finish_run(&self, _run_id: &str) {}
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Retry policy for retryable step failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of times a retryable failure will be retried.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub retry_base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryConfig {
    /// Back-off before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

// ---------------------------------------------------------------------------
// LocalStepRunner
// ---------------------------------------------------------------------------

/// In-process step runner with an in-memory journal of completed steps.
///
/// Survives re-invocation within one process (a redelivered trigger event
/// with the same id), not a process restart.
#[derive(Default)]
pub struct LocalStepRunner {
    journal: Mutex<HashMap<String, HashMap<String, Value>>>,
    retry: RetryConfig,
}

impl LocalStepRunner {
    pub fn new(retry: RetryConfig) -> Self {
        Self {
            journal: Mutex::new(HashMap::new()),
            retry,
        }
    }

    /// Step ids recorded as completed for `run_id`, sorted.
    pub async fn completed_steps(&self, run_id: &str) -> Vec<String> {
        let journal = self.journal.lock().await;
        let mut steps: Vec<String> = journal
            .get(run_id)
            .map(|steps| steps.keys().cloned().collect())
            .unwrap_or_default();
        steps.sort();
        steps
    }

    /// Number of runs with at least one recorded step.
    pub async fn journaled_runs(&self) -> usize {
        self.journal.lock().await.len()
    }

    async fn recorded(&self, run_id: &str, step_id: &str) -> Option<Value> {
        self.journal
            .lock()
            .await
            .get(run_id)
            .and_then(|steps| steps.get(step_id))
            .cloned()
    }

    async fn record(&self, run_id: &str, step_id: &str, output: Value) {
        self.journal
            .lock()
            .await
            .entry(run_id.to_owned())
            .or_default()
            .insert(step_id.to_owned(), output);
    }
}

#[async_trait]
impl StepRunner for LocalStepRunner {
    async fn run(&self, run_id: &str, step_id: &str, work: StepWork<'_>) -> Result<Value, NodeError> {
        if let Some(output) = self.recorded(run_id, step_id).await {
            debug!(run_id, step_id, "step replayed from journal");
            return Ok(output);
        }

        let mut attempts = 0u32;

        loop {
            match work().await {
                Ok(output) => {
                    self.record(run_id, step_id, output.clone()).await;
                    return Ok(output);
                }

                Err(err @ NodeError::Fatal(_)) => return Err(err),

                Err(NodeError::Retryable(msg)) => {
                    attempts += 1;
                    if attempts > self.retry.max_retries {
                        warn!(run_id, step_id, attempts, "step exceeded retry limit: {msg}");
                        return Err(NodeError::Retryable(msg));
                    }

                    let delay = self.retry.delay_for(attempts);
                    warn!(
                        "step '{}' retryable error (attempt {}/{}), retrying in {:?}: {}",
                        step_id, attempts, self.retry.max_retries, delay, msg
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn finish_run(&self, run_id: &str) {
        if self.journal.lock().await.remove(run_id).is_some() {
            debug!(run_id, "journal released");
        }
    }
}
