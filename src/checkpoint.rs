//! Checkpoint system for saving and loading simulation state.

use crate::agents::AgentPool;
use crate::config::Config;
use crate::fields::{PingPong, ScalarField};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Complete simulation state for checkpointing.
///
/// Density grids are not stored; they are derived each step and rebuilt
/// by re-scattering the pools on restore.
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Simulation clock
    pub time: f64,
    /// Sub-steps completed
    pub step_count: u64,
    /// Configuration
    pub config: Config,
    /// Random seed (for reproducibility)
    pub seed: u64,
    // Field buffers, ping-pong indices included
    pub reductant: PingPong,
    pub oxidant: PingPong,
    pub heat: PingPong,
    pub mat: PingPong,
    pub terrain: PingPong,
    pub overlap: ScalarField,
    pub feed: ScalarField,
    pub feed_avg: ScalarField,
    pub bedrock: ScalarField,
    // Agent pools
    pub prey: AgentPool,
    pub predators: AgentPool,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    /// Magic bytes identifying a ventworld checkpoint file
    pub const MAGIC: &'static [u8; 4] = b"VENT";

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(Self::MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != Self::MAGIC {
            return Err(CheckpointError::InvalidFormat(
                "invalid magic bytes".to_string(),
            ));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "Version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

/// Checkpoint manager for automatic interval saving
pub struct CheckpointManager {
    /// Base directory for checkpoints
    pub base_dir: String,
    /// Sub-steps between checkpoints
    pub interval: u64,
    /// Keep at most this many checkpoint files
    pub max_checkpoints: usize,
    saved: Vec<String>,
}

impl CheckpointManager {
    pub fn new(base_dir: &str, interval: u64, max_checkpoints: usize) -> Self {
        Self {
            base_dir: base_dir.to_string(),
            interval,
            max_checkpoints,
            saved: Vec::new(),
        }
    }

    /// True when `step` falls on a checkpoint boundary.
    pub fn should_save(&self, step: u64) -> bool {
        self.interval > 0 && step > 0 && step % self.interval == 0
    }

    /// Save a checkpoint and prune old files beyond the retention limit.
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<String, CheckpointError> {
        std::fs::create_dir_all(&self.base_dir)?;
        let path = format!("{}/checkpoint_{:010}.bin", self.base_dir, checkpoint.step_count);
        checkpoint.save(&path)?;
        log::info!("checkpoint saved: {} ({} bytes)", path, checkpoint.size_bytes());

        self.saved.push(path.clone());
        while self.saved.len() > self.max_checkpoints.max(1) {
            let old = self.saved.remove(0);
            if let Err(e) = std::fs::remove_file(&old) {
                log::warn!("failed to prune old checkpoint {}: {}", old, e);
            }
        }

        Ok(path)
    }

    /// Most recent checkpoint path, if any were saved this run.
    pub fn latest(&self) -> Option<&str> {
        self.saved.last().map(|s| s.as_str())
    }
}
