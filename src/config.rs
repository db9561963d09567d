//! Configuration for the ventworld simulation.
//!
//! Supports YAML configuration files with sensible defaults, plus a flat
//! `{name: f64}` parameter surface for hosts that drive single knobs at
//! runtime. Every write through the flat surface is clamped into the
//! parameter's declared range; unknown names are logged and ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub reductant: ReductantConfig,
    pub oxidant: OxidantConfig,
    pub heat: HeatConfig,
    pub mat: MatConfig,
    pub sim: SimConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub prey: PreyConfig,
    #[serde(default)]
    pub predator: PredatorConfig,
}

/// Grid dimensions (fixed for the lifetime of a run)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

/// Reducing-substance source, transport, and decay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReductantConfig {
    /// Vent center, in cells
    pub center_x: f32,
    pub center_y: f32,
    /// Peak injection strength at the center
    pub max_strength: f32,
    /// Radius over which the source falls off to zero
    pub decay_radius: f32,
    /// Exponent applied to the smoothstep falloff
    pub falloff_power: f32,
    pub diffusion_rate: f32,
    pub decay_rate: f32,
    /// Rotating background current
    pub advection_enabled: bool,
    pub advection_vx: f32,
    pub advection_vy: f32,
}

/// Oxidant relaxation, diffusion, and the R-O reaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OxidantConfig {
    /// Background concentration the field relaxes toward
    pub background: f32,
    pub relaxation_rate: f32,
    pub diffusion_rate: f32,
    /// Extra restoring pull toward the background
    pub restore_rate: f32,
    /// Bimolecular reaction rate for the R*O flux
    pub reaction_rate: f32,
}

/// Heat/waste trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatConfig {
    /// Initial fill value
    pub background: f32,
    pub decay_rate: f32,
    pub diffusion_rate: f32,
}

/// Microbial mat growth and the feed pools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatConfig {
    pub grow_rate: f32,
    pub death_rate: f32,
    /// Natural decay of the immediate feed pool
    pub feed_decay_rate: f32,
    /// Carrying capacity: base + alpha * feed_avg, floored at 0.001
    pub capacity_base: f32,
    pub capacity_alpha: f32,
    /// Rate of the slow moving average of feed
    pub feed_avg_rate: f32,
    /// Feed consumed per unit of mat growth
    pub yield_factor: f32,
    /// Initial mat fill and noise amplitude
    pub seed_base: f32,
    pub seed_noise: f32,
}

/// Time stepping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub delta_time: f32,
    /// Sub-steps per host frame
    pub speed_multiplier: u32,
}

/// Terrain geomorphology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    pub enabled: bool,
    /// Reference height used to normalise erosion and drift
    pub reference_height: f32,
    /// Waste-flux deposition
    pub deposition_rate: f32,
    /// Biomass (slow feed) deposition
    pub bio_deposition_rate: f32,
    pub erosion_rate: f32,
    /// Saturating boost of erosion with height
    pub height_erosion_alpha: f32,
    pub diffusion_rate: f32,
    /// Talus creep above the critical slope
    pub thermal_enabled: bool,
    pub talus_slope: f32,
    pub thermal_rate: f32,
    /// Downslope advection injected back into the chemistry fields
    pub flow_strength: f32,
    /// Downslope drift injected into agents
    pub drift_strength: f32,
}

/// Prey (grazer) pool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreyConfig {
    pub initial_count: usize,
    /// Fixed slot capacity of the pool
    pub capacity: usize,
    /// Pull along the feed gradient
    pub bias_strength: f32,
    pub friction: f32,
    pub noise_strength: f32,
    pub speed: f32,
    pub eat_enabled: bool,
    pub eat_amount: f32,
    pub energy_decay_rate: f32,
    pub energy_from_eat: f32,
    pub min_energy: f32,
    pub max_energy: f32,
    pub reproduce_enabled: bool,
    pub reproduce_threshold: f32,
    pub spawn_radius: f32,
}

/// Predator pool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredatorConfig {
    pub initial_count: usize,
    pub capacity: usize,
    /// Pull along the prey-density gradient
    pub bias_strength: f32,
    pub friction: f32,
    pub noise_strength: f32,
    pub speed: f32,
    pub eat_enabled: bool,
    pub eat_amount: f32,
    pub energy_decay_rate: f32,
    pub energy_from_eat: f32,
    pub min_energy: f32,
    pub max_energy: f32,
    pub reproduce_enabled: bool,
    pub reproduce_threshold: f32,
    pub spawn_radius: f32,
    /// Energy drained from prey per predator sharing the cell
    pub predation_strength: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            reductant: ReductantConfig::default(),
            oxidant: OxidantConfig::default(),
            heat: HeatConfig::default(),
            mat: MatConfig::default(),
            sim: SimConfig::default(),
            terrain: TerrainConfig::default(),
            prey: PreyConfig::default(),
            predator: PredatorConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
        }
    }
}

impl Default for ReductantConfig {
    fn default() -> Self {
        Self {
            center_x: 64.0,
            center_y: 64.0,
            max_strength: 0.8,
            decay_radius: 18.0,
            falloff_power: 2.0,
            diffusion_rate: 0.15,
            decay_rate: 0.02,
            advection_enabled: false,
            advection_vx: 0.4,
            advection_vy: 0.0,
        }
    }
}

impl Default for OxidantConfig {
    fn default() -> Self {
        Self {
            background: 0.6,
            relaxation_rate: 0.05,
            diffusion_rate: 0.1,
            restore_rate: 0.02,
            reaction_rate: 0.5,
        }
    }
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            background: 0.0,
            decay_rate: 0.05,
            diffusion_rate: 0.2,
        }
    }
}

impl Default for MatConfig {
    fn default() -> Self {
        Self {
            grow_rate: 0.8,
            death_rate: 0.05,
            feed_decay_rate: 0.01,
            capacity_base: 0.5,
            capacity_alpha: 2.0,
            feed_avg_rate: 0.05,
            yield_factor: 0.5,
            seed_base: 0.0,
            seed_noise: 0.00025,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            delta_time: 0.05,
            speed_multiplier: 1,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reference_height: 1.0,
            deposition_rate: 0.02,
            bio_deposition_rate: 0.01,
            erosion_rate: 0.01,
            height_erosion_alpha: 1.0,
            diffusion_rate: 0.02,
            thermal_enabled: true,
            talus_slope: 0.6,
            thermal_rate: 0.5,
            flow_strength: 0.3,
            drift_strength: 0.2,
        }
    }
}

impl Default for PreyConfig {
    fn default() -> Self {
        Self {
            initial_count: 512,
            capacity: 4096,
            bias_strength: 1.2,
            friction: 2.0,
            noise_strength: 0.6,
            speed: 6.0,
            eat_enabled: true,
            eat_amount: 0.5,
            energy_decay_rate: 0.05,
            energy_from_eat: 1.0,
            min_energy: 0.05,
            max_energy: 2.0,
            reproduce_enabled: true,
            reproduce_threshold: 1.5,
            spawn_radius: 2.0,
        }
    }
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            initial_count: 64,
            capacity: 1024,
            bias_strength: 1.5,
            friction: 2.0,
            noise_strength: 0.5,
            speed: 7.0,
            eat_enabled: true,
            eat_amount: 0.4,
            energy_decay_rate: 0.04,
            energy_from_eat: 0.5,
            min_energy: 0.05,
            max_energy: 2.5,
            reproduce_enabled: true,
            reproduce_threshold: 1.8,
            spawn_radius: 2.5,
            predation_strength: 0.4,
        }
    }
}

/// Result of a flat parameter write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Value stored (after clamping)
    Applied,
    /// Value stored; the named subsystem must be reinitialised
    Reinit(Reinit),
    /// Unknown parameter name, write dropped
    Ignored,
}

/// Subsystems whose seed values force a reinit when changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reinit {
    Oxidant,
    Heat,
    Prey,
    Predators,
}

#[inline]
fn cf(value: f64, lo: f32, hi: f32) -> f32 {
    (value as f32).clamp(lo, hi)
}

#[inline]
fn cu(value: f64, lo: usize, hi: usize) -> usize {
    (value.max(0.0) as usize).clamp(lo, hi)
}

#[inline]
fn cb(value: f64) -> bool {
    value > 0.5
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// These are the only fatal errors in the system; everything past
    /// construction self-corrects.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err("grid dimensions must be > 0".to_string());
        }
        if self.grid.width > 4096 || self.grid.height > 4096 {
            return Err("grid dimensions must be <= 4096".to_string());
        }
        if self.prey.capacity == 0 || self.predator.capacity == 0 {
            return Err("pool capacities must be > 0".to_string());
        }
        if self.prey.initial_count > self.prey.capacity {
            return Err("prey initial_count cannot exceed capacity".to_string());
        }
        if self.predator.initial_count > self.predator.capacity {
            return Err("predator initial_count cannot exceed capacity".to_string());
        }
        if !self.sim.delta_time.is_finite() || self.sim.delta_time < 0.0 {
            return Err("delta_time must be finite and >= 0".to_string());
        }
        if self.sim.speed_multiplier == 0 {
            return Err("speed_multiplier must be >= 1".to_string());
        }
        Ok(())
    }

    /// Write a single parameter through the flat surface.
    ///
    /// The value is clamped into the parameter's declared range. Writes to
    /// seed values (`oxidant.background`, `heat.background`, initial agent
    /// counts) report which subsystem must be rebuilt. Unknown names are
    /// logged at warn level and dropped.
    pub fn set(&mut self, name: &str, value: f64) -> SetOutcome {
        match name {
            // Grid (fixed during a run; clamped here for import paths)
            "grid.width" => self.grid.width = cu(value, 1, 4096),
            "grid.height" => self.grid.height = cu(value, 1, 4096),

            // Reductant
            "reductant.center_x" => self.reductant.center_x = cf(value, 0.0, 4096.0),
            "reductant.center_y" => self.reductant.center_y = cf(value, 0.0, 4096.0),
            "reductant.max_strength" => self.reductant.max_strength = cf(value, 0.0, 10.0),
            "reductant.decay_radius" => self.reductant.decay_radius = cf(value, 0.1, 4096.0),
            "reductant.falloff_power" => self.reductant.falloff_power = cf(value, 0.1, 8.0),
            "reductant.diffusion_rate" => self.reductant.diffusion_rate = cf(value, 0.0, 1.0),
            "reductant.decay_rate" => self.reductant.decay_rate = cf(value, 0.0, 10.0),
            "reductant.advection_enabled" => self.reductant.advection_enabled = cb(value),
            "reductant.advection_vx" => self.reductant.advection_vx = cf(value, -10.0, 10.0),
            "reductant.advection_vy" => self.reductant.advection_vy = cf(value, -10.0, 10.0),

            // Oxidant / reaction
            "oxidant.background" => {
                self.oxidant.background = cf(value, 0.0, 1.0);
                return SetOutcome::Reinit(Reinit::Oxidant);
            }
            "oxidant.relaxation_rate" => self.oxidant.relaxation_rate = cf(value, 0.0, 10.0),
            "oxidant.diffusion_rate" => self.oxidant.diffusion_rate = cf(value, 0.0, 1.0),
            "oxidant.restore_rate" => self.oxidant.restore_rate = cf(value, 0.0, 10.0),
            "oxidant.reaction_rate" => self.oxidant.reaction_rate = cf(value, 0.0, 10.0),

            // Heat
            "heat.background" => {
                self.heat.background = cf(value, 0.0, 10.0);
                return SetOutcome::Reinit(Reinit::Heat);
            }
            "heat.decay_rate" => self.heat.decay_rate = cf(value, 0.0, 10.0),
            "heat.diffusion_rate" => self.heat.diffusion_rate = cf(value, 0.0, 1.0),

            // Mat / feed
            "mat.grow_rate" => self.mat.grow_rate = cf(value, 0.0, 10.0),
            "mat.death_rate" => self.mat.death_rate = cf(value, 0.0, 10.0),
            "mat.feed_decay_rate" => self.mat.feed_decay_rate = cf(value, 0.0, 10.0),
            "mat.capacity_base" => self.mat.capacity_base = cf(value, 0.0, 10.0),
            "mat.capacity_alpha" => self.mat.capacity_alpha = cf(value, 0.0, 10.0),
            "mat.feed_avg_rate" => self.mat.feed_avg_rate = cf(value, 0.0, 10.0),
            "mat.yield_factor" => self.mat.yield_factor = cf(value, 0.0, 10.0),
            "mat.seed_base" => self.mat.seed_base = cf(value, 0.0, 10.0),
            "mat.seed_noise" => self.mat.seed_noise = cf(value, 0.0, 1.0),

            // Simulation
            "sim.delta_time" => self.sim.delta_time = cf(value, 0.0, 1.0),
            "sim.speed_multiplier" => self.sim.speed_multiplier = cu(value, 1, 64) as u32,

            // Terrain
            "terrain.enabled" => self.terrain.enabled = cb(value),
            "terrain.reference_height" => self.terrain.reference_height = cf(value, 1e-6, 1000.0),
            "terrain.deposition_rate" => self.terrain.deposition_rate = cf(value, 0.0, 10.0),
            "terrain.bio_deposition_rate" => {
                self.terrain.bio_deposition_rate = cf(value, 0.0, 10.0)
            }
            "terrain.erosion_rate" => self.terrain.erosion_rate = cf(value, 0.0, 10.0),
            "terrain.height_erosion_alpha" => {
                self.terrain.height_erosion_alpha = cf(value, 0.0, 10.0)
            }
            "terrain.diffusion_rate" => self.terrain.diffusion_rate = cf(value, 0.0, 1.0),
            "terrain.thermal_enabled" => self.terrain.thermal_enabled = cb(value),
            "terrain.talus_slope" => self.terrain.talus_slope = cf(value, 0.0, 100.0),
            "terrain.thermal_rate" => self.terrain.thermal_rate = cf(value, 0.0, 10.0),
            "terrain.flow_strength" => self.terrain.flow_strength = cf(value, 0.0, 100.0),
            "terrain.drift_strength" => self.terrain.drift_strength = cf(value, 0.0, 100.0),

            // Prey
            "prey.initial_count" => {
                self.prey.initial_count = cu(value, 0, self.prey.capacity);
                return SetOutcome::Reinit(Reinit::Prey);
            }
            "prey.bias_strength" => self.prey.bias_strength = cf(value, 0.0, 100.0),
            "prey.friction" => self.prey.friction = cf(value, 0.0, 100.0),
            "prey.noise_strength" => self.prey.noise_strength = cf(value, 0.0, 100.0),
            "prey.speed" => self.prey.speed = cf(value, 0.0, 100.0),
            "prey.eat_enabled" => self.prey.eat_enabled = cb(value),
            "prey.eat_amount" => self.prey.eat_amount = cf(value, 0.0, 10.0),
            "prey.energy_decay_rate" => self.prey.energy_decay_rate = cf(value, 0.0, 10.0),
            "prey.energy_from_eat" => self.prey.energy_from_eat = cf(value, 0.0, 10.0),
            "prey.min_energy" => self.prey.min_energy = cf(value, 0.0, 10.0),
            "prey.max_energy" => self.prey.max_energy = cf(value, 0.0, 10.0),
            "prey.reproduce_enabled" => self.prey.reproduce_enabled = cb(value),
            "prey.reproduce_threshold" => self.prey.reproduce_threshold = cf(value, 0.0, 10.0),
            "prey.spawn_radius" => self.prey.spawn_radius = cf(value, 0.0, 64.0),

            // Predator
            "predator.initial_count" => {
                self.predator.initial_count = cu(value, 0, self.predator.capacity);
                return SetOutcome::Reinit(Reinit::Predators);
            }
            "predator.bias_strength" => self.predator.bias_strength = cf(value, 0.0, 100.0),
            "predator.friction" => self.predator.friction = cf(value, 0.0, 100.0),
            "predator.noise_strength" => self.predator.noise_strength = cf(value, 0.0, 100.0),
            "predator.speed" => self.predator.speed = cf(value, 0.0, 100.0),
            "predator.eat_enabled" => self.predator.eat_enabled = cb(value),
            "predator.eat_amount" => self.predator.eat_amount = cf(value, 0.0, 10.0),
            "predator.energy_decay_rate" => {
                self.predator.energy_decay_rate = cf(value, 0.0, 10.0)
            }
            "predator.energy_from_eat" => self.predator.energy_from_eat = cf(value, 0.0, 10.0),
            "predator.min_energy" => self.predator.min_energy = cf(value, 0.0, 10.0),
            "predator.max_energy" => self.predator.max_energy = cf(value, 0.0, 10.0),
            "predator.reproduce_enabled" => self.predator.reproduce_enabled = cb(value),
            "predator.reproduce_threshold" => {
                self.predator.reproduce_threshold = cf(value, 0.0, 10.0)
            }
            "predator.spawn_radius" => self.predator.spawn_radius = cf(value, 0.0, 64.0),
            "predator.predation_strength" => {
                self.predator.predation_strength = cf(value, 0.0, 10.0)
            }

            _ => {
                log::warn!("unknown parameter '{}' ignored", name);
                return SetOutcome::Ignored;
            }
        }
        SetOutcome::Applied
    }

    /// Export every parameter as a flat `{name: f64}` bundle.
    pub fn to_bundle(&self) -> BTreeMap<String, f64> {
        let mut b = BTreeMap::new();
        let mut put = |k: &str, v: f64| {
            b.insert(k.to_string(), v);
        };

        put("grid.width", self.grid.width as f64);
        put("grid.height", self.grid.height as f64);

        put("reductant.center_x", self.reductant.center_x as f64);
        put("reductant.center_y", self.reductant.center_y as f64);
        put("reductant.max_strength", self.reductant.max_strength as f64);
        put("reductant.decay_radius", self.reductant.decay_radius as f64);
        put("reductant.falloff_power", self.reductant.falloff_power as f64);
        put("reductant.diffusion_rate", self.reductant.diffusion_rate as f64);
        put("reductant.decay_rate", self.reductant.decay_rate as f64);
        put(
            "reductant.advection_enabled",
            self.reductant.advection_enabled as u8 as f64,
        );
        put("reductant.advection_vx", self.reductant.advection_vx as f64);
        put("reductant.advection_vy", self.reductant.advection_vy as f64);

        put("oxidant.background", self.oxidant.background as f64);
        put("oxidant.relaxation_rate", self.oxidant.relaxation_rate as f64);
        put("oxidant.diffusion_rate", self.oxidant.diffusion_rate as f64);
        put("oxidant.restore_rate", self.oxidant.restore_rate as f64);
        put("oxidant.reaction_rate", self.oxidant.reaction_rate as f64);

        put("heat.background", self.heat.background as f64);
        put("heat.decay_rate", self.heat.decay_rate as f64);
        put("heat.diffusion_rate", self.heat.diffusion_rate as f64);

        put("mat.grow_rate", self.mat.grow_rate as f64);
        put("mat.death_rate", self.mat.death_rate as f64);
        put("mat.feed_decay_rate", self.mat.feed_decay_rate as f64);
        put("mat.capacity_base", self.mat.capacity_base as f64);
        put("mat.capacity_alpha", self.mat.capacity_alpha as f64);
        put("mat.feed_avg_rate", self.mat.feed_avg_rate as f64);
        put("mat.yield_factor", self.mat.yield_factor as f64);
        put("mat.seed_base", self.mat.seed_base as f64);
        put("mat.seed_noise", self.mat.seed_noise as f64);

        put("sim.delta_time", self.sim.delta_time as f64);
        put("sim.speed_multiplier", self.sim.speed_multiplier as f64);

        put("terrain.enabled", self.terrain.enabled as u8 as f64);
        put("terrain.reference_height", self.terrain.reference_height as f64);
        put("terrain.deposition_rate", self.terrain.deposition_rate as f64);
        put(
            "terrain.bio_deposition_rate",
            self.terrain.bio_deposition_rate as f64,
        );
        put("terrain.erosion_rate", self.terrain.erosion_rate as f64);
        put(
            "terrain.height_erosion_alpha",
            self.terrain.height_erosion_alpha as f64,
        );
        put("terrain.diffusion_rate", self.terrain.diffusion_rate as f64);
        put(
            "terrain.thermal_enabled",
            self.terrain.thermal_enabled as u8 as f64,
        );
        put("terrain.talus_slope", self.terrain.talus_slope as f64);
        put("terrain.thermal_rate", self.terrain.thermal_rate as f64);
        put("terrain.flow_strength", self.terrain.flow_strength as f64);
        put("terrain.drift_strength", self.terrain.drift_strength as f64);

        put("prey.initial_count", self.prey.initial_count as f64);
        put("prey.bias_strength", self.prey.bias_strength as f64);
        put("prey.friction", self.prey.friction as f64);
        put("prey.noise_strength", self.prey.noise_strength as f64);
        put("prey.speed", self.prey.speed as f64);
        put("prey.eat_enabled", self.prey.eat_enabled as u8 as f64);
        put("prey.eat_amount", self.prey.eat_amount as f64);
        put("prey.energy_decay_rate", self.prey.energy_decay_rate as f64);
        put("prey.energy_from_eat", self.prey.energy_from_eat as f64);
        put("prey.min_energy", self.prey.min_energy as f64);
        put("prey.max_energy", self.prey.max_energy as f64);
        put("prey.reproduce_enabled", self.prey.reproduce_enabled as u8 as f64);
        put("prey.reproduce_threshold", self.prey.reproduce_threshold as f64);
        put("prey.spawn_radius", self.prey.spawn_radius as f64);

        put("predator.initial_count", self.predator.initial_count as f64);
        put("predator.bias_strength", self.predator.bias_strength as f64);
        put("predator.friction", self.predator.friction as f64);
        put("predator.noise_strength", self.predator.noise_strength as f64);
        put("predator.speed", self.predator.speed as f64);
        put("predator.eat_enabled", self.predator.eat_enabled as u8 as f64);
        put("predator.eat_amount", self.predator.eat_amount as f64);
        put(
            "predator.energy_decay_rate",
            self.predator.energy_decay_rate as f64,
        );
        put("predator.energy_from_eat", self.predator.energy_from_eat as f64);
        put("predator.min_energy", self.predator.min_energy as f64);
        put("predator.max_energy", self.predator.max_energy as f64);
        put(
            "predator.reproduce_enabled",
            self.predator.reproduce_enabled as u8 as f64,
        );
        put(
            "predator.reproduce_threshold",
            self.predator.reproduce_threshold as f64,
        );
        put("predator.spawn_radius", self.predator.spawn_radius as f64);
        put(
            "predator.predation_strength",
            self.predator.predation_strength as f64,
        );

        b
    }

    /// Import a flat bundle: clamp every known key, skip unknown keys.
    pub fn apply_bundle(&mut self, bundle: &BTreeMap<String, f64>) {
        for (name, &value) in bundle {
            self.set(name, value);
        }
    }
}
