//! Configuration constants for the game runner
//!
//! This module centralizes the defaults used by the CLI and by `RunConfig`.

use std::time::Duration;

// ============================================================================
// Input Configuration
// ============================================================================

pub const DEFAULT_INPUT_PATH: &str = "dist_input.txt";

pub const DEFAULT_COMMAND: &str = "./bin/runner";

/// Number of games submitted when the caller does not ask for a specific count
pub const DEFAULT_GAME_COUNT: usize = 4;

// ============================================================================
// Worker Configuration
// ============================================================================

pub const DEFAULT_CONCURRENCY: usize = 4;

pub const MAX_ATTEMPTS: u32 = 5;

pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Timeout for a single invocation of the external executable
///
/// Games are CPU bound and may legitimately run for a while, so this is generous.
/// It only exists so that a hung simulation cannot stall a worker forever.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120); // 2 minutes

// ============================================================================
// Logging Configuration
// ============================================================================

/// Maximum number of stderr bytes echoed into debug logs per attempt
pub const STDERR_LOG_LIMIT: usize = 512;
