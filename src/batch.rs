//! Batch driver: step the world many times while staying responsive.
//!
//! Work is done in bounded chunks; between chunks the runner checks a
//! cooperative cancel flag and hands control back to the host. Every
//! completed sub-step leaves the world in a valid state, so cancelling is
//! always safe.

use crate::stats::{Stats, StatsHistory};
use crate::world::World;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Cancelled,
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    /// Sub-steps actually executed
    pub completed: u64,
    pub elapsed: Duration,
    pub final_stats: Stats,
    /// Periodic samples taken during the run
    pub samples: StatsHistory,
}

/// Drives a world for N sub-steps with periodic stat sampling.
pub struct BatchRunner {
    /// Sample stats every this many sub-steps (0 disables sampling)
    pub sample_every: u64,
    /// Upper bound on sub-steps between yields
    pub chunk_size: u64,
    /// Upper bound on wall time between yields
    pub yield_budget: Duration,
}

impl BatchRunner {
    pub fn new(sample_every: u64) -> Self {
        Self {
            sample_every,
            chunk_size: 512,
            yield_budget: Duration::from_millis(8),
        }
    }

    /// Run `steps` sub-steps, checking `cancel` between chunks.
    pub fn run(&self, world: &mut World, steps: u64, cancel: &AtomicBool) -> BatchReport {
        self.run_with_yield(world, steps, cancel, |_, _| {})
    }

    /// Like [`run`](Self::run), with a callback at every yield point.
    pub fn run_with_yield<F>(
        &self,
        world: &mut World,
        steps: u64,
        cancel: &AtomicBool,
        mut on_yield: F,
    ) -> BatchReport
    where
        F: FnMut(&World, u64),
    {
        let start = Instant::now();
        let mut samples = StatsHistory::new(self.sample_every);
        let mut completed = 0u64;
        let mut outcome = BatchOutcome::Completed;

        while completed < steps {
            if cancel.load(Ordering::Relaxed) {
                outcome = BatchOutcome::Cancelled;
                break;
            }

            let chunk_start = Instant::now();
            let chunk_end = (completed + self.chunk_size.max(1)).min(steps);
            while completed < chunk_end {
                world.step();
                completed += 1;
                if self.sample_every > 0 && completed % self.sample_every == 0 {
                    samples.record(world.stats());
                }
                if chunk_start.elapsed() >= self.yield_budget {
                    break;
                }
            }
            on_yield(world, completed);
        }

        BatchReport {
            outcome,
            completed,
            elapsed: start.elapsed(),
            final_stats: world.stats(),
            samples,
        }
    }
}
