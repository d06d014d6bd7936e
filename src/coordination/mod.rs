//! Concurrent job execution: worker pool, retry loop, ordered collection

pub mod coordinator;
pub mod delay;
pub mod job;
pub mod queue;
pub mod worker;

pub use coordinator::{Coordinator, RunResult};
pub use delay::TokioSleeper;
pub use job::{Job, Outcome, RunConfig, RunConfigBuilder, RunOutcome};
