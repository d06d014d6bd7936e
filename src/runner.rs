//! High-level runner API for the game runner.
//!
//! This module wraps input parsing, job construction, and the coordinator behind a
//! single call. It is the primary API for external users and for the CLI.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::coordination::{Coordinator, RunConfigBuilder, TokioSleeper};
use crate::io::{ProcessInvoker, read_parameter_file};

pub use crate::coordination::{Job, Outcome, RunConfig, RunOutcome, RunResult};
pub use crate::formats::InvocationRequest;

/// Arguments for a batch of games
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// File holding the shared parameter vector (header token first)
    pub input_path: PathBuf,

    // Executable configuration
    pub command: PathBuf,
    pub command_args: Vec<String>,

    /// Games are numbered `1..=game_count`
    pub game_count: usize,

    // Performance tuning
    pub worker_count: usize,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,

    pub quiet: bool,
}

/// Build `count` jobs that all share the same parameter vector
pub fn build_jobs(parameters: &[f64], count: usize) -> Vec<Job> {
    (1..=count as u64)
        .map(|id| Job::new(id, parameters.to_vec()))
        .collect()
}

/// Run jobs against an executable using the real process invoker
///
/// Outcomes come back in the same order as `jobs`.
pub async fn run_all(jobs: Vec<Job>, config: &RunConfig) -> RunResult {
    let invoker = Arc::new(ProcessInvoker::new(&config.command, config.args.clone()));
    let coordinator = Coordinator::new(invoker, Arc::new(TokioSleeper));
    coordinator.run_all(jobs, config).await
}

/// Read the input file and run every game
///
/// Input errors abort before any process is started. Individual game failures do
/// not; they show up as failed outcomes in the result.
///
/// # Example
///
/// ```no_run
/// use game_runner::runner::{RunArgs, run_games};
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = RunArgs {
///     input_path: "dist_input.txt".into(),
///     command: "./bin/runner".into(),
///     command_args: Vec::new(),
///     game_count: 4,
///     worker_count: 4,
///     timeout: Duration::from_secs(120),
///     max_attempts: 5,
///     retry_delay: Duration::from_secs(1),
///     quiet: true,
/// };
///
/// let result = run_games(args).await?;
/// for outcome in &result.outcomes {
///     println!("{:?}", outcome.tokens());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_games(args: RunArgs) -> Result<RunResult> {
    let config = RunConfigBuilder::default()
        .command(args.command)
        .args(args.command_args)
        .concurrency(args.worker_count)
        .timeout(args.timeout)
        .max_attempts(args.max_attempts)
        .retry_delay(args.retry_delay)
        .quiet(args.quiet)
        .build()
        .context("Invalid run configuration")?;

    let parameters = read_parameter_file(&args.input_path).await?;
    let jobs = build_jobs(&parameters, args.game_count);

    Ok(run_all(jobs, &config).await)
}
