//! # VENTWORLD
//!
//! Deterministic 2D reaction-transport simulator of a hydrothermal-vent
//! ecosystem: coupled chemistry fields, evolving chimney terrain, and two
//! populations of mobile agents (grazing prey and predators).
//!
//! ## Features
//!
//! - **Parallel**: field and agent kernels run on all cores via Rayon
//! - **Reproducible**: seeded world init plus hash-based per-agent RNG,
//!   so identical seeds give identical buffers
//! - **Configurable**: YAML configuration files and a flat runtime
//!   parameter surface
//! - **Checkpointable**: full state save/resume
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ventworld::{Config, World};
//!
//! let config = Config::default();
//! let mut world = World::new(config).unwrap();
//!
//! world.run(1000);
//!
//! let stats = world.stats();
//! println!("{}", stats.summary());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use ventworld::Config;
//!
//! let mut config = Config::default();
//! config.grid.width = 256;
//! config.predator.initial_count = 128;
//! ```

pub mod agents;
pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod fields;
pub mod kernels;
pub mod math;
pub mod rng;
pub mod stats;
pub mod world;

// Re-export main types
pub use batch::{BatchOutcome, BatchReport, BatchRunner};
pub use config::Config;
pub use stats::Stats;
pub use world::{FieldKind, World};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, width: usize, height: usize) -> Result<BenchmarkResult, String> {
    use std::time::Instant;

    let mut config = Config::default();
    config.grid.width = width;
    config.grid.height = height;
    config.reductant.center_x = width as f32 / 2.0;
    config.reductant.center_y = height as f32 / 2.0;

    let mut world = World::new_with_seed(config, 42)?;

    let start = Instant::now();
    world.run(steps);
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        cells: width * height,
        prey_final: world.prey_alive(),
        predators_final: world.predators_alive(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub cells: usize,
    pub prey_final: usize,
    pub predators_final: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Cells: {}", self.cells)?;
        writeln!(
            f,
            "Population: {} prey, {} predators",
            self.prey_final, self.predators_final
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut config = Config::default();
        config.grid.width = 32;
        config.grid.height = 32;
        config.prey.initial_count = 32;
        config.prey.capacity = 128;
        config.predator.initial_count = 4;
        config.predator.capacity = 32;

        let mut world = World::new_with_seed(config, 1).unwrap();
        world.run(100);

        assert_eq!(world.step_count, 100);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(20, 32, 32).unwrap();

        assert_eq!(result.steps, 20);
        assert!(result.steps_per_second > 0.0);
    }
}
