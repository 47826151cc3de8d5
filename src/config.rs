//! Scheduler configuration.

use std::time::Duration;

/// Default remaining-time floor below which the work loop yields.
pub const DEFAULT_YIELD_THRESHOLD: Duration = Duration::from_millis(1);

/// Default length of one wall-clock slice for [`SliceDeadline`](crate::SliceDeadline).
pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(5);

/// Tuning for the cooperative work loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Yield once the slice has less than this left.
    pub yield_threshold: Duration,
    /// Budget handed to slices built with `SliceDeadline::from_config`.
    pub slice_budget: Duration,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget = budget;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: DEFAULT_YIELD_THRESHOLD,
            slice_budget: DEFAULT_SLICE_BUDGET,
        }
    }
}
