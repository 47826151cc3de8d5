//! Deadlines - how the host tells the work loop when to give control back.
//!
//! The engine owns no timers. Whoever drives it hands each slice a
//! [`Deadline`]; the loop checks it after every unit and yields when
//! [`Deadline::should_yield`] says so.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::config::SchedulerConfig;

/// Remaining-time estimate for the current slice.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;

    /// Called once after each processed unit.
    fn should_yield(&self, threshold: Duration) -> bool {
        self.time_remaining() < threshold
    }
}

/// Wall-clock slice starting now.
#[derive(Debug, Clone, Copy)]
pub struct SliceDeadline {
    start: Instant,
    budget: Duration,
}

impl SliceDeadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.slice_budget)
    }
}

impl Deadline for SliceDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Never yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }

    fn should_yield(&self, _threshold: Duration) -> bool {
        false
    }
}

/// Deterministic slice that allows exactly `units` units of work.
#[derive(Debug)]
pub struct StepDeadline {
    remaining: Cell<u32>,
}

impl StepDeadline {
    pub fn new(units: u32) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }

    /// Units still allowed in this slice.
    pub fn remaining_units(&self) -> u32 {
        self.remaining.get()
    }
}

impl Deadline for StepDeadline {
    /// One unit counts as one millisecond.
    fn time_remaining(&self) -> Duration {
        Duration::from_millis(u64::from(self.remaining.get()))
    }

    fn should_yield(&self, _threshold: Duration) -> bool {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        left == 0
    }
}
