//! Wall-clock timing for pipeline stages.
//!
//! The timer is purely observational: whatever the wrapped operation returns,
//! including an `Err`, comes back untouched.

use chrono::{DateTime, Utc};
use log::info;
use std::time::{Duration, Instant};

/// How long one stage took
#[derive(Debug, Clone)]
pub struct StageTiming {
    /// Human-readable stage label
    pub label: String,

    /// When the stage started
    pub started_at: DateTime<Utc>,

    /// Monotonic elapsed time
    pub elapsed: Duration,
}

impl StageTiming {
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Result of a timed operation together with its timing
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub timing: StageTiming,
}

/// Run `op` synchronously and measure it
///
/// **Public** - used by the orchestrator around every stage
///
/// # Arguments
/// * `label` - Stage description, logged when the stage starts
/// * `op` - Operation to run
///
/// # Returns
/// The operation's own value and the elapsed duration
pub fn time_stage<T, F>(label: &str, op: F) -> Timed<T>
where
    F: FnOnce() -> T,
{
    info!("{}", label);

    let started_at = Utc::now();
    let start = Instant::now();
    let value = op();
    let elapsed = start.elapsed();

    Timed {
        value,
        timing: StageTiming {
            label: label.to_string(),
            started_at,
            elapsed,
        },
    }
}
