use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::delay::Sleeper;
use super::job::{Job, Outcome, RunOutcome};
use super::queue::JobQueue;
use crate::error::AttemptError;
use crate::formats::{InvocationRequest, InvocationResult, decode_output};
use crate::io::Invoker;
use crate::telemetry::TelemetryEvent;

/// Retry policy applied to every job
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

/// Worker that claims jobs from the queue and runs them to completion
pub struct Worker {
    pub worker_id: usize,
    pub invoker: Arc<dyn Invoker>,
    pub sleeper: Arc<dyn Sleeper>,
    pub policy: RetryPolicy,
    pub telemetry_tx: mpsc::UnboundedSender<TelemetryEvent>,
    pub result_tx: mpsc::UnboundedSender<(usize, RunOutcome)>,
}

impl Worker {
    pub fn new(
        worker_id: usize,
        invoker: Arc<dyn Invoker>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        telemetry_tx: mpsc::UnboundedSender<TelemetryEvent>,
        result_tx: mpsc::UnboundedSender<(usize, RunOutcome)>,
    ) -> Self {
        Self {
            worker_id,
            invoker,
            sleeper,
            policy,
            telemetry_tx,
            result_tx,
        }
    }

    /// Run the worker loop until the queue is drained
    ///
    /// Returns the number of jobs this worker processed.
    pub async fn run(&self, queue: Arc<JobQueue>) -> Result<usize> {
        let mut processed = 0;

        while let Some((index, job)) = queue.claim_next() {
            debug!("Worker {} claimed job {} (slot {})", self.worker_id, job.id, index);
            let outcome = self.run_one(&job).await;
            processed += 1;

            if self.result_tx.send((index, outcome)).is_err() {
                anyhow::bail!("Result channel closed before job {} was reported", job.id);
            }
        }

        Ok(processed)
    }

    /// Run a single job, retrying failed attempts up to the policy limit
    ///
    /// Never fails: exhausting the attempts yields an `Outcome::Failed`.
    pub async fn run_one(&self, job: &Job) -> RunOutcome {
        let _ = self
            .telemetry_tx
            .send(TelemetryEvent::JobStarted { job_id: job.id });
        let started = Instant::now();

        let request = InvocationRequest::new(job.id, &job.parameters);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.policy.max_attempts {
            attempts += 1;

            match self.attempt(&request).await {
                Ok(tokens) => {
                    if attempts > 1 {
                        info!("Job {} succeeded on attempt {}", job.id, attempts);
                    }
                    return self.finish(job, Outcome::Completed { tokens }, attempts, started);
                }
                Err(e) => {
                    warn!(
                        "Job {} attempt {}/{} failed: {}",
                        job.id, attempts, self.policy.max_attempts, e
                    );
                    let _ = self.telemetry_tx.send(TelemetryEvent::AttemptFailed {
                        job_id: job.id,
                        timed_out: e.is_timeout(),
                    });
                    last_error = Some(e);

                    if attempts < self.policy.max_attempts {
                        self.sleeper.sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        warn!(
            "Job {} failed after {} attempts: {}",
            job.id, attempts, error
        );

        self.finish(job, Outcome::Failed { error }, attempts, started)
    }

    async fn attempt(&self, request: &InvocationRequest) -> Result<InvocationResult, AttemptError> {
        let output = self.invoker.invoke(request, self.policy.timeout).await?;
        decode_output(&output.stdout, output.exit_code)
    }

    fn finish(&self, job: &Job, outcome: Outcome, attempts: u32, started: Instant) -> RunOutcome {
        let succeeded = matches!(outcome, Outcome::Completed { .. });
        let _ = self.telemetry_tx.send(TelemetryEvent::JobFinished {
            job_id: job.id,
            succeeded,
            attempts,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        RunOutcome {
            id: job.id,
            outcome,
            attempts,
            completed_at: Utc::now().to_rfc3339(),
        }
    }
}
