//! VENTWORLD - CLI entry point
//!
//! Hydrothermal-vent ecosystem simulator.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use ventworld::checkpoint::{Checkpoint, CheckpointManager};
use ventworld::{benchmark, BatchOutcome, BatchRunner, Config, World};

#[derive(Parser)]
#[command(name = "ventworld")]
#[command(version)]
#[command(about = "Deterministic hydrothermal-vent ecosystem simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of sub-steps to simulate
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Output directory for checkpoints
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Steps between checkpoints (0 disables)
        #[arg(long, default_value = "5000")]
        checkpoint_every: u64,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume simulation from checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional sub-steps
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run the batch driver with periodic stat sampling
    Batch {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of sub-steps
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Sample stats every N sub-steps
        #[arg(long, default_value = "100")]
        sample_every: u64,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Where to write the sampled stats (JSON)
        #[arg(long, default_value = "batch_stats.json")]
        stats_out: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of sub-steps
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Grid width and height
        #[arg(short, long, default_value = "128")]
        grid: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            checkpoint_every,
            quiet,
        } => run_simulation(config, steps, output, seed, checkpoint_every, quiet),
        Commands::Resume {
            checkpoint,
            steps,
            output,
        } => resume_simulation(checkpoint, steps, output),
        Commands::Batch {
            config,
            steps,
            sample_every,
            seed,
            stats_out,
        } => run_batch(config, steps, sample_every, seed, stats_out),
        Commands::Benchmark { steps, grid } => {
            let result = benchmark(steps, grid, grid)?;
            println!("{}", result);
            Ok(())
        }
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            println!("Wrote default configuration to {}", output.display());
            Ok(())
        }
        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        Config::from_file(path)
    } else {
        log::warn!("config file {} not found, using defaults", path.display());
        Ok(Config::default())
    }
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    output: PathBuf,
    seed: Option<u64>,
    checkpoint_every: u64,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;

    let mut world = match seed {
        Some(s) => World::new_with_seed(config, s)?,
        None => World::new(config)?,
    };
    log::info!(
        "world created: {}x{} grid, {} prey, {} predators, seed {}",
        world.config.grid.width,
        world.config.grid.height,
        world.prey_alive(),
        world.predators_alive(),
        world.seed()
    );

    let mut manager = CheckpointManager::new(
        output.to_str().unwrap_or("output"),
        checkpoint_every,
        5,
    );

    let start = Instant::now();
    let report_every = (steps / 20).max(1);
    for i in 0..steps {
        world.step();
        if !quiet && (i + 1) % report_every == 0 {
            println!("{}", world.stats().summary());
        }
        if manager.should_save(world.step_count) {
            manager.save(&world.create_checkpoint())?;
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!("{}", world.stats().summary());
    println!(
        "Completed {} steps in {:.2}s ({:.1} steps/s)",
        steps,
        elapsed,
        steps as f64 / elapsed
    );

    manager.save(&world.create_checkpoint())?;
    Ok(())
}

fn resume_simulation(
    checkpoint_path: PathBuf,
    steps: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut world = World::from_checkpoint(checkpoint)?;
    log::info!(
        "resumed at step {} with {} prey, {} predators",
        world.step_count,
        world.prey_alive(),
        world.predators_alive()
    );

    let mut manager = CheckpointManager::new(output.to_str().unwrap_or("output"), 0, 5);
    world.run(steps);
    println!("{}", world.stats().summary());
    manager.save(&world.create_checkpoint())?;
    Ok(())
}

fn run_batch(
    config_path: PathBuf,
    steps: u64,
    sample_every: u64,
    seed: Option<u64>,
    stats_out: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    let mut world = match seed {
        Some(s) => World::new_with_seed(config, s)?,
        None => World::new(config)?,
    };

    // Hosts embedding the library share this flag with another thread to
    // stop a run early; the CLI has no second thread, so it stays false.
    let cancel = Arc::new(AtomicBool::new(false));

    let runner = BatchRunner::new(sample_every);
    let report = runner.run(&mut world, steps, &cancel);

    match report.outcome {
        BatchOutcome::Completed => println!("Batch completed: {} steps", report.completed),
        BatchOutcome::Cancelled => println!("Batch cancelled after {} steps", report.completed),
    }
    println!("{}", report.final_stats.summary());
    println!(
        "Elapsed {:.2}s ({:.1} steps/s)",
        report.elapsed.as_secs_f64(),
        report.completed as f64 / report.elapsed.as_secs_f64().max(1e-9)
    );

    report
        .samples
        .save(stats_out.to_str().unwrap_or("batch_stats.json"))?;
    println!("Wrote {} samples to {}", report.samples.snapshots.len(), stats_out.display());
    Ok(())
}

fn analyze_checkpoint(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint = Checkpoint::load(&path)?;
    println!("=== Checkpoint Analysis ===");
    println!("Version: {}", checkpoint.version);
    println!("Step: {}", checkpoint.step_count);
    println!("Time: {:.3}", checkpoint.time);
    println!("Seed: {}", checkpoint.seed);
    println!(
        "Grid: {}x{}",
        checkpoint.config.grid.width, checkpoint.config.grid.height
    );
    println!("Size: {} bytes", checkpoint.size_bytes());

    let world = World::from_checkpoint(checkpoint)?;
    let stats = world.stats();
    println!("{}", stats.summary());
    if stats.prey_invalid > 0 || stats.predator_invalid > 0 {
        println!(
            "WARNING: invalid agent positions (prey {}, predators {})",
            stats.prey_invalid, stats.predator_invalid
        );
    }
    Ok(())
}
