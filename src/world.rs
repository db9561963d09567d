//! World state and the per-step kernel pipeline.

use crate::agents::{AgentPool, SPECIES_PREDATOR, SPECIES_PREY};
use crate::checkpoint::Checkpoint;
use crate::config::{Config, Reinit, SetOutcome};
use crate::fields::{DensityGrid, PingPong, ScalarField};
use crate::kernels;
use crate::stats::Stats;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Named read-only views for the snapshot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Reductant,
    Oxidant,
    Overlap,
    Heat,
    Mat,
    Feed,
    FeedAvg,
    Terrain,
    Bedrock,
}

/// The simulation world: parameter bundle, field buffers, agent pools,
/// and the scheduler that advances them.
pub struct World {
    // Configuration (immutable during a sub-step)
    pub config: Config,

    // Clock
    pub time: f64,
    pub step_count: u64,

    // Chemistry and terrain
    reductant: PingPong,
    oxidant: PingPong,
    heat: PingPong,
    mat: PingPong,
    terrain: PingPong,
    overlap: ScalarField,
    feed: ScalarField,
    feed_avg: ScalarField,
    bedrock: ScalarField,

    // Agents
    prey: AgentPool,
    predators: AgentPool,
    prey_density: DensityGrid,
    predator_density: DensityGrid,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl World {
    /// Create a new world with the given configuration.
    pub fn new(config: Config) -> Result<Self, String> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility.
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, String> {
        config.validate()?;

        let w = config.grid.width;
        let h = config.grid.height;
        let mut world = Self {
            reductant: PingPong::new(ScalarField::new(w, h, 0.0)),
            oxidant: PingPong::new(ScalarField::new(w, h, 0.0)),
            heat: PingPong::new(ScalarField::new(w, h, 0.0)),
            mat: PingPong::new(ScalarField::new(w, h, 0.0)),
            terrain: PingPong::new(ScalarField::new(w, h, 0.0)),
            overlap: ScalarField::new(w, h, 0.0),
            feed: ScalarField::new(w, h, 0.0),
            feed_avg: ScalarField::new(w, h, 0.0),
            bedrock: ScalarField::new(w, h, 0.0),
            prey: AgentPool::new(config.prey.capacity),
            predators: AgentPool::new(config.predator.capacity),
            prey_density: DensityGrid::new(w, h),
            predator_density: DensityGrid::new(w, h),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            time: 0.0,
            step_count: 0,
            config,
        };
        world.initialize();
        Ok(world)
    }

    /// Reinitialise to step 0 with the current parameters.
    ///
    /// The RNG is reseeded from the original seed, so a reset reproduces
    /// the same initial state distribution.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.time = 0.0;
        self.step_count = 0;
        self.initialize();
    }

    fn initialize(&mut self) {
        self.reductant.reset(0.0);
        self.oxidant.reset(self.config.oxidant.background);
        self.heat.reset(self.config.heat.background);
        self.terrain.reset(0.0);
        self.overlap.fill(0.0);
        self.feed.fill(0.0);
        self.feed_avg.fill(0.0);
        self.bedrock.fill(0.0);
        self.seed_mat();

        let w = self.config.grid.width;
        let h = self.config.grid.height;
        self.prey
            .seed(self.config.prey.initial_count, SPECIES_PREY, w, h, &mut self.rng);
        self.predators.seed(
            self.config.predator.initial_count,
            SPECIES_PREDATOR,
            w,
            h,
            &mut self.rng,
        );
        self.prey_density.clear();
        self.predator_density.clear();
    }

    /// Fill M with `seed_base` plus a little uniform noise, clamped at 0.
    fn seed_mat(&mut self) {
        let base = self.config.mat.seed_base;
        let amp = self.config.mat.seed_noise;
        let mut initial = ScalarField::new(self.config.grid.width, self.config.grid.height, 0.0);
        for v in initial.as_mut_slice() {
            let noise = if amp > 0.0 {
                self.rng.gen_range(-amp..amp)
            } else {
                0.0
            };
            *v = (base + noise).max(0.0);
        }
        self.mat = PingPong::new(initial);
    }

    /// Run one full sub-step of the kernel pipeline.
    ///
    /// Dispatch order matters: every phase is a barrier against the next,
    /// buffer flips sit between stencil reads and their consumers, and the
    /// agent output buffers are zeroed before their update kernels so a
    /// stale record can never pose as a free reproduction target.
    pub fn step(&mut self) {
        self.time += self.config.sim.delta_time as f64;

        // 1. Reductant
        {
            let (cur, next) = self.reductant.split();
            kernels::reductant::update(cur, self.terrain.read(), next, &self.config, self.time);
        }
        self.reductant.swap();

        // 2. Oxidant (credits feed in place)
        {
            let (cur, next) = self.oxidant.split();
            kernels::oxidant::update(
                cur,
                self.reductant.read(),
                self.mat.read(),
                self.terrain.read(),
                next,
                &mut self.feed,
                &self.config,
            );
        }
        self.oxidant.swap();

        // 3. Overlap C = R * O
        kernels::overlap::compute(self.reductant.read(), self.oxidant.read(), &mut self.overlap);

        // 4-5. Heat: production, then diffusion, each with its own flip
        {
            let (cur, next) = self.heat.split();
            kernels::heat::update(
                cur,
                self.reductant.read(),
                self.oxidant.read(),
                self.mat.read(),
                next,
                &self.config,
            );
        }
        self.heat.swap();
        {
            let (cur, next) = self.heat.split();
            kernels::heat::diffuse(cur, next, &self.config);
        }
        self.heat.swap();

        // 6. Microbial mat (mutates feed and the slow feed average)
        {
            let (cur, next) = self.mat.split();
            kernels::microbes::update(cur, next, &mut self.feed, &mut self.feed_avg, &self.config);
        }
        self.mat.swap();

        // 7-8. Prey density
        self.prey_density.clear();
        self.prey.scatter(&self.prey_density);

        // 9-10. Predators (read prey density)
        self.predators.clear_next();
        kernels_predator_update(self);
        self.predators.swap();

        // 11-12. Predator density
        self.predator_density.clear();
        self.predators.scatter(&self.predator_density);

        // 13. Prey (read predator density, mutate feed)
        self.prey.clear_next();
        kernels_prey_update(self);
        self.prey.swap();

        // 14. Terrain
        {
            let (cur, next) = self.terrain.split();
            kernels::terrain::update(
                cur,
                &self.bedrock,
                self.reductant.read(),
                self.oxidant.read(),
                self.mat.read(),
                &self.feed_avg,
                next,
                &self.config,
            );
        }
        self.terrain.swap();

        self.step_count += 1;
    }

    /// Run `speed_multiplier` sub-steps (one host-visible frame).
    pub fn frame(&mut self) {
        let substeps = self.config.sim.speed_multiplier;
        for _ in 0..substeps {
            self.step();
        }
    }

    /// Run the pipeline for the given number of sub-steps.
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Run with a callback after each sub-step.
    pub fn run_with_callback<F>(&mut self, steps: u64, mut callback: F)
    where
        F: FnMut(&World, u64),
    {
        for i in 0..steps {
            self.step();
            callback(self, i);
        }
    }

    /// Clamp-and-store a parameter; rebuild the affected subsystem when a
    /// seed value changed.
    ///
    /// Grid dimensions are fixed for the lifetime of a world; writes to
    /// them are dropped here so the buffers and the config cannot drift
    /// apart.
    pub fn set_param(&mut self, name: &str, value: f64) -> SetOutcome {
        if name.starts_with("grid.") {
            log::warn!("parameter '{}' is fixed for a running world, ignored", name);
            return SetOutcome::Ignored;
        }
        let outcome = self.config.set(name, value);
        if let SetOutcome::Reinit(target) = outcome {
            let w = self.config.grid.width;
            let h = self.config.grid.height;
            match target {
                Reinit::Oxidant => self.oxidant.reset(self.config.oxidant.background),
                Reinit::Heat => self.heat.reset(self.config.heat.background),
                Reinit::Prey => self.prey.seed(
                    self.config.prey.initial_count,
                    SPECIES_PREY,
                    w,
                    h,
                    &mut self.rng,
                ),
                Reinit::Predators => self.predators.seed(
                    self.config.predator.initial_count,
                    SPECIES_PREDATOR,
                    w,
                    h,
                    &mut self.rng,
                ),
            }
            log::info!("parameter '{}' changed, reinitialised {:?}", name, target);
        }
        outcome
    }

    /// Copy a named field out for a consumer.
    pub fn snapshot_field(&self, kind: FieldKind) -> Vec<f32> {
        self.field(kind).as_slice().to_vec()
    }

    /// Borrow a named field.
    pub fn field(&self, kind: FieldKind) -> &ScalarField {
        match kind {
            FieldKind::Reductant => self.reductant.read(),
            FieldKind::Oxidant => self.oxidant.read(),
            FieldKind::Overlap => &self.overlap,
            FieldKind::Heat => self.heat.read(),
            FieldKind::Mat => self.mat.read(),
            FieldKind::Feed => &self.feed,
            FieldKind::FeedAvg => &self.feed_avg,
            FieldKind::Terrain => self.terrain.read(),
            FieldKind::Bedrock => &self.bedrock,
        }
    }

    /// Copy the prey/predator density counts out.
    pub fn snapshot_prey_density(&self) -> Vec<u32> {
        self.prey_density.to_vec()
    }

    pub fn snapshot_predator_density(&self) -> Vec<u32> {
        self.predator_density.to_vec()
    }

    /// Borrow the live agent pools.
    pub fn prey(&self) -> &AgentPool {
        &self.prey
    }

    pub fn predators(&self) -> &AgentPool {
        &self.predators
    }

    /// Raw 32-byte-per-slot views for external tools.
    pub fn snapshot_prey_bytes(&self) -> Vec<u8> {
        self.prey.as_bytes().to_vec()
    }

    pub fn snapshot_predator_bytes(&self) -> Vec<u8> {
        self.predators.as_bytes().to_vec()
    }

    /// Compute the current field and population statistics.
    pub fn stats(&self) -> Stats {
        Stats::measure(self)
    }

    /// Count of live prey / predators.
    pub fn prey_alive(&self) -> usize {
        self.prey.alive()
    }

    pub fn predators_alive(&self) -> usize {
        self.predators.alive()
    }

    /// Seed used to initialise this world.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Create a checkpoint of the current state.
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: Checkpoint::VERSION,
            time: self.time,
            step_count: self.step_count,
            config: self.config.clone(),
            seed: self.seed,
            reductant: self.reductant.clone(),
            oxidant: self.oxidant.clone(),
            heat: self.heat.clone(),
            mat: self.mat.clone(),
            terrain: self.terrain.clone(),
            overlap: self.overlap.clone(),
            feed: self.feed.clone(),
            feed_avg: self.feed_avg.clone(),
            bedrock: self.bedrock.clone(),
            prey: self.prey.clone(),
            predators: self.predators.clone(),
        }
    }

    /// Restore a world from a checkpoint.
    ///
    /// Density grids are derived state and are rebuilt by re-scattering
    /// the restored pools.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, String> {
        checkpoint.config.validate()?;
        let w = checkpoint.config.grid.width;
        let h = checkpoint.config.grid.height;

        let world = Self {
            rng: ChaCha8Rng::seed_from_u64(checkpoint.seed),
            seed: checkpoint.seed,
            time: checkpoint.time,
            step_count: checkpoint.step_count,
            reductant: checkpoint.reductant,
            oxidant: checkpoint.oxidant,
            heat: checkpoint.heat,
            mat: checkpoint.mat,
            terrain: checkpoint.terrain,
            overlap: checkpoint.overlap,
            feed: checkpoint.feed,
            feed_avg: checkpoint.feed_avg,
            bedrock: checkpoint.bedrock,
            prey: checkpoint.prey,
            predators: checkpoint.predators,
            prey_density: DensityGrid::new(w, h),
            predator_density: DensityGrid::new(w, h),
            config: checkpoint.config,
        };

        world.prey_density.clear();
        world.prey.scatter(&world.prey_density);
        world.predator_density.clear();
        world.predators.scatter(&world.predator_density);

        Ok(world)
    }
}

// Thin wrappers so the phase list above stays readable; the agent kernels
// need several disjoint borrows of self at once.
fn kernels_predator_update(world: &mut World) {
    crate::agents::predator::update(
        &mut world.predators,
        &world.prey_density,
        world.terrain.read(),
        &world.config,
        world.time,
    );
}

fn kernels_prey_update(world: &mut World) {
    crate::agents::prey::update(
        &mut world.prey,
        &mut world.feed,
        &world.predator_density,
        world.terrain.read(),
        &world.config,
        world.time,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.grid.width = 48;
        config.grid.height = 48;
        config.reductant.center_x = 24.0;
        config.reductant.center_y = 24.0;
        config.prey.initial_count = 64;
        config.prey.capacity = 256;
        config.predator.initial_count = 8;
        config.predator.capacity = 64;
        config
    }

    #[test]
    fn test_world_creation() {
        let config = test_config();
        let world = World::new_with_seed(config.clone(), 42).unwrap();

        assert_eq!(world.prey_alive(), config.prey.initial_count);
        assert_eq!(world.predators_alive(), config.predator.initial_count);
        assert_eq!(world.step_count, 0);
        assert_eq!(world.field(FieldKind::Oxidant).get(0, 0), config.oxidant.background);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = test_config();
        config.grid.width = 0;
        assert!(World::new_with_seed(config, 1).is_err());
    }

    #[test]
    fn test_step_advances_clock() {
        let mut world = World::new_with_seed(test_config(), 42).unwrap();
        world.step();
        assert_eq!(world.step_count, 1);
        assert!((world.time - world.config.sim.delta_time as f64).abs() < 1e-12);
    }

    #[test]
    fn test_frame_runs_substeps() {
        let mut config = test_config();
        config.sim.speed_multiplier = 4;
        let mut world = World::new_with_seed(config, 42).unwrap();
        world.frame();
        assert_eq!(world.step_count, 4);
    }

    #[test]
    fn test_invariants_after_steps() {
        let mut world = World::new_with_seed(test_config(), 42).unwrap();
        world.run(25);

        assert!(world.field(FieldKind::Reductant).in_range(0.0, 1.0));
        assert!(world.field(FieldKind::Oxidant).in_range(0.0, 1.0));
        assert!(world.field(FieldKind::Overlap).in_range(0.0, 1.0));
        assert!(world.field(FieldKind::Heat).in_range(0.0, 10.0));
        assert!(world.field(FieldKind::Mat).in_range(0.0, 10.0));
        assert!(world.field(FieldKind::Feed).in_range(0.0, 10.0));
        assert!(world.field(FieldKind::FeedAvg).in_range(0.0, 10.0));

        let terrain = world.field(FieldKind::Terrain);
        let bedrock = world.field(FieldKind::Bedrock);
        for y in 0..48 {
            for x in 0..48 {
                assert!(terrain.get(x, y) >= bedrock.get(x, y));
                assert!(terrain.get(x, y) <= 1000.0);
            }
        }

        let max_x = 47.0;
        for a in world.prey().read().iter().chain(world.predators().read().iter()) {
            if a.is_active() {
                assert!(a.x.is_finite() && a.y.is_finite());
                assert!(a.x >= 0.0 && a.x <= max_x);
                assert!(a.y >= 0.0 && a.y <= max_x);
            }
        }
    }

    #[test]
    fn test_density_matches_alive_after_step() {
        let mut world = World::new_with_seed(test_config(), 7).unwrap();
        world.run(5);

        // Predator density was scattered from the post-update predator
        // pool inside the step, before the prey update ran.
        let dp2_total: u64 = world.snapshot_predator_density().iter().map(|&c| c as u64).sum();
        assert_eq!(dp2_total, world.predators_alive() as u64);
    }

    #[test]
    fn test_reset_reproduces_initial_state() {
        let config = test_config();
        let mut world = World::new_with_seed(config, 99).unwrap();
        let initial_prey = world.snapshot_prey_bytes();

        world.run(10);
        world.reset();

        assert_eq!(world.step_count, 0);
        assert_eq!(world.snapshot_prey_bytes(), initial_prey);
    }

    #[test]
    fn test_set_param_reinit() {
        let mut world = World::new_with_seed(test_config(), 5).unwrap();
        world.run(3);

        world.set_param("oxidant.background", 0.25);
        assert!(world
            .field(FieldKind::Oxidant)
            .as_slice()
            .iter()
            .all(|&v| v == 0.25));

        world.set_param("prey.initial_count", 10.0);
        assert_eq!(world.prey_alive(), 10);
    }

    #[test]
    fn test_set_param_grid_is_locked() {
        let mut world = World::new_with_seed(test_config(), 5).unwrap();
        assert_eq!(world.set_param("grid.width", 256.0), SetOutcome::Ignored);
        assert_eq!(world.config.grid.width, 48);
    }

    #[test]
    fn test_set_param_unknown_is_noop() {
        let mut world = World::new_with_seed(test_config(), 5).unwrap();
        let before = world.config.clone();
        assert_eq!(world.set_param("bogus.name", 1.0), SetOutcome::Ignored);
        assert_eq!(world.config.oxidant.background, before.oxidant.background);
    }

    #[test]
    fn test_determinism() {
        let config = test_config();
        let mut a = World::new_with_seed(config.clone(), 1234).unwrap();
        let mut b = World::new_with_seed(config, 1234).unwrap();

        a.run(20);
        b.run(20);

        assert_eq!(a.snapshot_prey_bytes(), b.snapshot_prey_bytes());
        assert_eq!(a.snapshot_predator_bytes(), b.snapshot_predator_bytes());
        assert_eq!(
            a.snapshot_field(FieldKind::Reductant),
            b.snapshot_field(FieldKind::Reductant)
        );
        assert_eq!(
            a.snapshot_field(FieldKind::Terrain),
            b.snapshot_field(FieldKind::Terrain)
        );
    }

    #[test]
    fn test_zero_dt_freezes_fields() {
        let mut config = test_config();
        config.sim.delta_time = 0.0;
        // Keep reproduction out of the picture: halving is not dt-gated.
        config.prey.reproduce_enabled = false;
        config.predator.reproduce_enabled = false;

        let mut world = World::new_with_seed(config, 11).unwrap();
        world.run(3);
        let r = world.snapshot_field(FieldKind::Reductant);
        let o = world.snapshot_field(FieldKind::Oxidant);
        let positions: Vec<(u32, u32, u32)> = world
            .prey()
            .read()
            .iter()
            .map(|a| (a.x.to_bits(), a.y.to_bits(), a.state))
            .collect();

        world.step();

        assert_eq!(world.snapshot_field(FieldKind::Reductant), r);
        assert_eq!(world.snapshot_field(FieldKind::Oxidant), o);
        // Positions, velocities, and energies are all dt-scaled; only the
        // exploration heading may advance at dt = 0.
        let after: Vec<(u32, u32, u32)> = world
            .prey()
            .read()
            .iter()
            .map(|a| (a.x.to_bits(), a.y.to_bits(), a.state))
            .collect();
        assert_eq!(after, positions);
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let mut world = World::new_with_seed(test_config(), 31).unwrap();
        world.run(8);

        let checkpoint = world.create_checkpoint();
        let restored = World::from_checkpoint(checkpoint).unwrap();

        assert_eq!(restored.step_count, world.step_count);
        assert_eq!(restored.prey_alive(), world.prey_alive());
        assert_eq!(
            restored.snapshot_field(FieldKind::Terrain),
            world.snapshot_field(FieldKind::Terrain)
        );
        assert_eq!(restored.snapshot_prey_bytes(), world.snapshot_prey_bytes());
    }
}
