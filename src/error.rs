use std::time::Duration;

use thiserror::Error;

/// Why a single attempt at running the external executable did not produce a result.
///
/// Every variant is retryable; the worker decides when to give up.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("I/O error while talking to process: {0}")]
    Io(#[from] std::io::Error),

    #[error("process output is not ASCII (first bad byte at offset {0})")]
    NonAscii(usize),

    #[error("process produced no output (exit code {code:?})")]
    EmptyOutput { code: Option<i32> },
}

impl AttemptError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::Timeout(_))
    }
}
