//! Run clock for stage timing.
//!
//! Every pipeline run is anchored to a monotonic instant plus the wall-clock
//! time it started, so the final summary can report both.

use std::time::Instant;

/// A clock anchored to the moment a pipeline run started.
#[derive(Debug, Clone)]
pub struct RunClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,
}

impl RunClock {
    /// Create a clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Milliseconds elapsed since the run started.
    pub fn elapsed_ms(&self) -> u128 {
        self.epoch.elapsed().as_millis()
    }

    /// Wall-clock time at run start.
    pub fn started_at(&self) -> &str {
        &self.epoch_wall
    }

    /// Start timing a single stage.
    pub fn stage(&self) -> StageTimer {
        StageTimer {
            started: Instant::now(),
        }
    }
}

/// Measures one stage of a run.
#[derive(Debug, Clone, Copy)]
pub struct StageTimer {
    started: Instant,
}

impl StageTimer {
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}
