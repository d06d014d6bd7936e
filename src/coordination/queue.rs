use std::collections::VecDeque;
use std::sync::Mutex;

use super::job::Job;

/// Jobs waiting for a worker, tagged with their submission index
///
/// Workers claim one job at a time; a job is handed out exactly once.
#[derive(Debug)]
pub struct JobQueue {
    pending: Mutex<VecDeque<(usize, Job)>>,
}

impl JobQueue {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            pending: Mutex::new(jobs.into_iter().enumerate().collect()),
        }
    }

    /// Take the next unclaimed job, or `None` once the queue is drained
    pub fn claim_next(&self) -> Option<(usize, Job)> {
        // A poisoned lock only means another worker panicked mid-claim; the deque is intact
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
