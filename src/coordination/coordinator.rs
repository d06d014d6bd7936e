use chrono::Utc;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::delay::Sleeper;
use super::job::{Job, Outcome, RunConfig, RunOutcome};
use super::queue::JobQueue;
use super::worker::{RetryPolicy, Worker};
use crate::io::Invoker;
use crate::telemetry::{ProgressStats, TelemetryEvent};

/// Result of a completed run
#[derive(Debug)]
pub struct RunResult {
    pub run_id: String,
    /// One entry per submitted job, in submission order
    pub outcomes: Vec<RunOutcome>,
    pub attempts_total: u64,
    pub duration: Duration,
}

impl RunResult {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// The Coordinator runs a batch of jobs on a bounded pool of workers.
pub struct Coordinator {
    invoker: Arc<dyn Invoker>,
    sleeper: Arc<dyn Sleeper>,
}

impl Coordinator {
    /// Create a new Coordinator instance
    pub fn new(invoker: Arc<dyn Invoker>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { invoker, sleeper }
    }

    /// Run every job and return the outcomes in submission order
    ///
    /// This method orchestrates the entire run:
    /// 1. Queue the jobs with their submission index
    /// 2. Spawn `concurrency` workers that claim jobs until the queue is drained
    /// 3. Track progress from worker telemetry
    /// 4. Join all workers, then place each outcome in its job's slot
    ///
    /// Job failures never fail the run; every job gets an outcome.
    pub async fn run_all(&self, jobs: Vec<Job>, config: &RunConfig) -> RunResult {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let job_ids: Vec<u64> = jobs.iter().map(|j| j.id).collect();

        info!(
            "Starting run {}: {} jobs, {} workers, command {}",
            run_id,
            jobs.len(),
            config.concurrency,
            config.command.display()
        );

        let queue = Arc::new(JobQueue::new(jobs));

        let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel::<TelemetryEvent>();
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, RunOutcome)>();
        let worker_handles = self.spawn_worker_pool(config, &queue, telemetry_tx, result_tx);

        let prog_jh = Self::setup_progress_tracking(config, job_ids.len() as u64, telemetry_rx);

        let worker_results = futures::future::join_all(worker_handles).await;

        // Wait for the progress bar to finish so we don't collide output
        let stats = prog_jh.await.ok();

        for (i, result) in worker_results.iter().enumerate() {
            match result {
                Ok(Ok(processed)) => {
                    info!("Worker {} processed {} jobs", i, processed);
                }
                Ok(Err(e)) => {
                    warn!("Worker {} failed: {:#}", i, e);
                }
                Err(e) => {
                    warn!("Worker {} panicked: {:#}", i, e);
                }
            }
        }

        // Every sender was owned by a worker, so the channel is closed once they are joined
        let mut slots: Vec<Option<RunOutcome>> = vec![None; job_ids.len()];
        while let Some((index, outcome)) = result_rx.recv().await {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(outcome);
            }
        }

        let outcomes = Self::fill_missing_slots(slots, &job_ids);
        let attempts_total = outcomes.iter().map(|o| u64::from(o.attempts)).sum();
        let duration = start_time.elapsed();

        let result = RunResult {
            run_id,
            outcomes,
            attempts_total,
            duration,
        };

        info!(
            "Run {} complete: {} succeeded, {} failed, {} attempts in {:.2}s",
            result.run_id,
            result.succeeded(),
            result.failed(),
            result.attempts_total,
            duration.as_secs_f64()
        );
        if let Some(stats) = stats
            && stats.attempts_timed_out > 0
        {
            info!("{} attempts timed out", stats.attempts_timed_out);
        }

        result
    }

    /// Spawn worker tasks that share the job queue
    fn spawn_worker_pool(
        &self,
        config: &RunConfig,
        queue: &Arc<JobQueue>,
        telemetry_tx: mpsc::UnboundedSender<TelemetryEvent>,
        result_tx: mpsc::UnboundedSender<(usize, RunOutcome)>,
    ) -> Vec<tokio::task::JoinHandle<anyhow::Result<usize>>> {
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay,
            timeout: config.timeout,
        };

        // More workers than jobs would only exit immediately
        let worker_count = config.concurrency.min(queue.remaining()).max(1);
        info!("Spawning {} workers...", worker_count);

        (0..worker_count)
            .map(|worker_id| {
                let worker = Worker::new(
                    worker_id,
                    Arc::clone(&self.invoker),
                    Arc::clone(&self.sleeper),
                    policy,
                    telemetry_tx.clone(),
                    result_tx.clone(),
                );
                let queue = Arc::clone(queue);

                tokio::spawn(async move { worker.run(queue).await })
            })
            .collect()
    }

    /// A slot stays empty only when its worker died mid-job
    fn fill_missing_slots(slots: Vec<Option<RunOutcome>>, job_ids: &[u64]) -> Vec<RunOutcome> {
        slots
            .into_iter()
            .zip(job_ids)
            .map(|(slot, &id)| {
                slot.unwrap_or_else(|| {
                    warn!("Job {} has no outcome; its worker terminated", id);
                    RunOutcome {
                        id,
                        outcome: Outcome::Failed {
                            error: "worker terminated before reporting".to_string(),
                        },
                        attempts: 0,
                        completed_at: Utc::now().to_rfc3339(),
                    }
                })
            })
            .collect()
    }

    /// Drain telemetry, drawing progress bars unless running quietly
    ///
    /// The returned task ends once every worker has dropped its sender.
    fn setup_progress_tracking(
        config: &RunConfig,
        total_jobs: u64,
        mut telemetry_rx: mpsc::UnboundedReceiver<TelemetryEvent>,
    ) -> tokio::task::JoinHandle<ProgressStats> {
        if config.quiet {
            // Still drain the channel so stats are available for the summary
            return tokio::spawn(async move {
                let mut stats = ProgressStats::new();
                while let Some(event) = telemetry_rx.recv().await {
                    stats.update(&event);
                }
                stats
            });
        }

        let multi_progress = MultiProgress::new();

        let job_bar = multi_progress.add(ProgressBar::new(total_jobs));
        job_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] Games: [{bar:30.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        let stats_bar = multi_progress.add(ProgressBar::new(0));
        stats_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] Game Time: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        tokio::spawn(async move {
            let mut stats = ProgressStats::new();

            while let Some(event) = telemetry_rx.recv().await {
                stats.update(&event);

                match &event {
                    TelemetryEvent::AttemptFailed { job_id, timed_out } => {
                        let reason = if *timed_out { "timed out" } else { "failed" };
                        job_bar.set_message(format!(
                            "game {} {}, retries so far: {}",
                            job_id, reason, stats.attempts_failed
                        ));
                    }
                    TelemetryEvent::JobFinished {
                        job_id, succeeded, ..
                    } => {
                        job_bar.set_position(stats.jobs_completed as u64);
                        if !succeeded {
                            job_bar.set_message(format!("game {} gave up", job_id));
                        }
                    }
                    TelemetryEvent::JobStarted { job_id } => {
                        job_bar.set_message(format!(
                            "running game {} ({} of {} started)",
                            job_id, stats.jobs_started, total_jobs
                        ));
                    }
                }

                let (p50, p90, p99) = stats.get_percentiles();
                if let (Some(p50), Some(p90), Some(p99)) = (p50, p90, p99) {
                    stats_bar.set_message(format!(
                        "p50: {}ms, p90: {}ms, p99: {}ms, attempts: {}",
                        p50, p90, p99, stats.attempts_total
                    ));
                }
            }

            if stats.jobs_failed > 0 {
                job_bar.finish_with_message(format!("{} games failed", stats.jobs_failed));
            } else {
                job_bar.finish_with_message("All games completed");
            }

            let (p50, p90, p99) = stats.get_percentiles();
            if let (Some(p50), Some(p90), Some(p99)) = (p50, p90, p99) {
                stats_bar.finish_with_message(format!(
                    "p50: {}ms, p90: {}ms, p99: {}ms, attempts: {}",
                    p50, p90, p99, stats.attempts_total
                ));
            } else {
                stats_bar.finish();
            }

            stats
        })
    }
}
