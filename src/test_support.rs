//! In-process stand-ins for the external executable and the retry timer

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::coordination::delay::Sleeper;
use crate::error::AttemptError;
use crate::formats::InvocationRequest;
use crate::io::Invoker;
use crate::io::process::ProcessOutput;

/// What the fake executable does on one attempt
#[derive(Debug, Clone)]
pub enum Step {
    /// Exit 0 with this stdout
    Output(&'static str),
    /// Exit 0 echoing the request line back
    EchoRequest,
    Timeout,
    SpawnError,
    /// Panic inside the invoker, taking the calling worker down with it
    Panic,
}

#[derive(Default)]
struct Calls {
    per_job: HashMap<u64, Vec<String>>,
}

/// Invoker driven by a per-job script of steps
///
/// Jobs without a script, or whose script is used up, get the default step.
pub struct ScriptedInvoker {
    default_step: Step,
    scripts: Mutex<HashMap<u64, VecDeque<Step>>>,
    latency: HashMap<u64, Duration>,
    default_latency: Duration,
    calls: Mutex<Calls>,
    completed: Mutex<Vec<u64>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn always(step: Step) -> Self {
        Self {
            default_step: step,
            scripts: Mutex::new(HashMap::new()),
            latency: HashMap::new(),
            default_latency: Duration::ZERO,
            calls: Mutex::new(Calls::default()),
            completed: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Steps played for `job_id` before falling back to the default
    pub fn with_prefix(self, job_id: u64, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().insert(job_id, steps.into());
        self
    }

    pub fn with_latency(mut self, job_id: u64, latency: Duration) -> Self {
        self.latency.insert(job_id, latency);
        self
    }

    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    pub fn calls_for(&self, job_id: u64) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .per_job
            .get(&job_id)
            .map_or(0, |c| c.len() as u32)
    }

    pub fn requests_for(&self, job_id: u64) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .per_job
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Highest number of invocations observed in flight at the same time
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Job ids in the order their invocations returned
    pub fn completion_order(&self) -> Vec<u64> {
        self.completed.lock().unwrap().clone()
    }

    fn next_step(&self, job_id: u64) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&job_id)
            .and_then(|steps| steps.pop_front())
            .unwrap_or_else(|| self.default_step.clone())
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    async fn invoke(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> Result<ProcessOutput, AttemptError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap()
            .per_job
            .entry(request.job_id)
            .or_default()
            .push(request.line().to_string());

        let latency = self
            .latency
            .get(&request.job_id)
            .copied()
            .unwrap_or(self.default_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let step = self.next_step(request.job_id);
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(request.job_id);

        match step {
            Step::Output(text) => Ok(ProcessOutput {
                exit_code: Some(0),
                stdout: text.as_bytes().to_vec(),
                stderr: Vec::new(),
            }),
            Step::EchoRequest => Ok(ProcessOutput {
                exit_code: Some(0),
                stdout: format!("{}\n", request.line()).into_bytes(),
                stderr: Vec::new(),
            }),
            Step::Timeout => Err(AttemptError::Timeout(timeout)),
            Step::SpawnError => Err(AttemptError::Spawn {
                command: "scripted".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            Step::Panic => panic!("scripted invoker panic for job {}", request.job_id),
        }
    }
}

/// Sleeper that records requested delays instead of waiting
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
