use derive_builder::Builder;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ATTEMPT_TIMEOUT, DEFAULT_CONCURRENCY, MAX_ATTEMPTS, RETRY_DELAY};
use crate::formats::InvocationResult;

/// One game to run: an identifier plus the parameters fed to the executable
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u64,
    pub parameters: Vec<f64>,
}

impl Job {
    pub fn new(id: u64, parameters: Vec<f64>) -> Self {
        Self { id, parameters }
    }
}

/// Final state of a job after its attempt loop ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed { tokens: InvocationResult },
    Failed { error: String },
}

/// Outcome for a single job, reported in submission order
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub attempts: u32,
    pub completed_at: String,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { .. })
    }

    pub fn tokens(&self) -> Option<&[String]> {
        match &self.outcome {
            Outcome::Completed { tokens } => Some(tokens),
            Outcome::Failed { .. } => None,
        }
    }
}

/// Settings shared by every worker of a run
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RunConfig {
    #[builder(setter(into))]
    pub command: PathBuf,
    #[builder(default)]
    pub args: Vec<String>,
    #[builder(default = "DEFAULT_CONCURRENCY")]
    pub concurrency: usize,
    #[builder(default = "MAX_ATTEMPTS")]
    pub max_attempts: u32,
    #[builder(default = "RETRY_DELAY")]
    pub retry_delay: Duration,
    #[builder(default = "ATTEMPT_TIMEOUT")]
    pub timeout: Duration,
    #[builder(default)]
    pub quiet: bool,
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
