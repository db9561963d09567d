//! Statistics reductions and history tracking.

use crate::agents::AgentPool;
use crate::world::{FieldKind, World};
use serde::{Deserialize, Serialize};

/// Statistics snapshot for one simulation step
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Simulation clock at measurement time
    pub time: f64,
    /// Sub-steps completed
    pub step: u64,
    /// Total reductant mass
    pub r_total: f64,
    /// Mean oxidant concentration
    pub o_avg: f64,
    /// Mean heat
    pub h_avg: f64,
    /// Total microbial mat
    pub m_total: f64,
    /// Total immediate feed
    pub b_total: f64,
    /// Total terrain height
    pub z_total: f64,
    /// Live prey
    pub prey_alive: usize,
    /// Live predators
    pub predator_alive: usize,
    /// Active prey slots with NaN or out-of-grid positions
    pub prey_invalid: usize,
    /// Active predator slots with NaN or out-of-grid positions
    pub predator_invalid: usize,
}

fn count_invalid(pool: &AgentPool, width: usize, height: usize) -> usize {
    pool.read()
        .iter()
        .filter(|a| a.is_active())
        .filter(|a| {
            !a.x.is_finite()
                || !a.y.is_finite()
                || a.x < 0.0
                || a.x >= width as f32
                || a.y < 0.0
                || a.y >= height as f32
        })
        .count()
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce the world's fields and pools into one snapshot.
    pub fn measure(world: &World) -> Self {
        let width = world.config.grid.width;
        let height = world.config.grid.height;

        Self {
            time: world.time,
            step: world.step_count,
            r_total: world.field(FieldKind::Reductant).sum(),
            o_avg: world.field(FieldKind::Oxidant).average(),
            h_avg: world.field(FieldKind::Heat).average(),
            m_total: world.field(FieldKind::Mat).sum(),
            b_total: world.field(FieldKind::Feed).sum(),
            z_total: world.field(FieldKind::Terrain).sum(),
            prey_alive: world.prey_alive(),
            predator_alive: world.predators_alive(),
            prey_invalid: count_invalid(world.prey(), width, height),
            predator_invalid: count_invalid(world.predators(), width, height),
        }
    }

    /// Save stats to JSON file
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load stats from JSON file
    pub fn load_json(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:8.2} | Step:{:7} | R:{:8.1} | O:{:.3} | H:{:.3} | M:{:8.1} | B:{:8.1} | Prey:{:5} | Pred:{:4}",
            self.time,
            self.step,
            self.r_total,
            self.o_avg,
            self.h_avg,
            self.m_total,
            self.b_total,
            self.prey_alive,
            self.predator_alive,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval (sub-steps)
    pub interval: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Population of both species over time
    pub fn population_series(&self) -> Vec<(u64, usize, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.step, s.prey_alive, s.predator_alive))
            .collect()
    }

    /// Total mat over time
    pub fn mat_series(&self) -> Vec<(u64, f64)> {
        self.snapshots.iter().map(|s| (s.step, s.m_total)).collect()
    }

    /// Total terrain height over time
    pub fn terrain_series(&self) -> Vec<(u64, f64)> {
        self.snapshots.iter().map(|s| (s.step, s.z_total)).collect()
    }

    /// Save history to file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
