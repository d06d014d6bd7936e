/// Telemetry events sent from workers to the coordinator for progress tracking
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// Worker claimed a job and is about to run its first attempt
    JobStarted { job_id: u64 },
    /// One attempt failed; the job may still be retried
    AttemptFailed { job_id: u64, timed_out: bool },
    /// Attempt loop ended for a job
    JobFinished {
        job_id: u64,
        succeeded: bool,
        attempts: u32,
        duration_ms: u64,
    },
}

/// Statistics aggregated from telemetry events
#[derive(Debug, Default, Clone)]
pub struct ProgressStats {
    pub jobs_started: usize,
    pub jobs_completed: usize,
    pub jobs_failed: usize,
    pub attempts_failed: u64,
    pub attempts_timed_out: u64,
    pub attempts_total: u64,
    pub job_durations_ms: Vec<u64>,
}

impl ProgressStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a telemetry event
    pub fn update(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::JobStarted { .. } => {
                self.jobs_started += 1;
            }
            TelemetryEvent::AttemptFailed { timed_out, .. } => {
                self.attempts_failed += 1;
                if *timed_out {
                    self.attempts_timed_out += 1;
                }
            }
            TelemetryEvent::JobFinished {
                succeeded,
                attempts,
                duration_ms,
                ..
            } => {
                self.jobs_completed += 1;
                if !succeeded {
                    self.jobs_failed += 1;
                }
                self.attempts_total += u64::from(*attempts);
                self.job_durations_ms.push(*duration_ms);
            }
        }
    }

    /// Calculate percentile from job durations
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.job_durations_ms.is_empty() {
            return None;
        }

        let mut sorted = self.job_durations_ms.clone();
        sorted.sort_unstable();

        let index = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = index.saturating_sub(1).min(sorted.len() - 1);

        Some(sorted[index])
    }

    /// Get p50, p90, p99 percentiles
    pub fn get_percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.percentile(50.0),
            self.percentile(90.0),
            self.percentile(99.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(job_id: u64, succeeded: bool, attempts: u32, duration_ms: u64) -> TelemetryEvent {
        TelemetryEvent::JobFinished {
            job_id,
            succeeded,
            attempts,
            duration_ms,
        }
    }

    #[test]
    fn test_update_counts() {
        let mut stats = ProgressStats::new();
        stats.update(&TelemetryEvent::JobStarted { job_id: 1 });
        stats.update(&TelemetryEvent::JobStarted { job_id: 2 });
        stats.update(&TelemetryEvent::AttemptFailed {
            job_id: 2,
            timed_out: true,
        });
        stats.update(&TelemetryEvent::AttemptFailed {
            job_id: 2,
            timed_out: false,
        });
        stats.update(&finished(1, true, 1, 10));
        stats.update(&finished(2, false, 2, 30));

        assert_eq!(stats.jobs_started, 2);
        assert_eq!(stats.jobs_completed, 2);
        assert_eq!(stats.jobs_failed, 1);
        assert_eq!(stats.attempts_failed, 2);
        assert_eq!(stats.attempts_timed_out, 1);
        assert_eq!(stats.attempts_total, 3);
    }

    #[test]
    fn test_percentiles() {
        let mut stats = ProgressStats::new();
        assert_eq!(stats.get_percentiles(), (None, None, None));

        for (i, ms) in (1..=10).map(|v| v * 10).enumerate() {
            stats.update(&finished(i as u64, true, 1, ms));
        }

        assert_eq!(stats.percentile(50.0), Some(50));
        assert_eq!(stats.percentile(90.0), Some(90));
        assert_eq!(stats.percentile(99.0), Some(100));
        assert_eq!(stats.percentile(0.0), Some(10));
    }
}
