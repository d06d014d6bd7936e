// Public API - only expose the runner module
pub mod runner;

// Internal modules - organized by subsystem
mod config;
mod coordination;
mod error;
mod formats;
mod io;
mod telemetry;

pub use config::{
    ATTEMPT_TIMEOUT, DEFAULT_COMMAND, DEFAULT_CONCURRENCY, DEFAULT_GAME_COUNT, DEFAULT_INPUT_PATH,
    MAX_ATTEMPTS, RETRY_DELAY,
};

#[cfg(test)]
mod test_support;
