//! Predator update kernel.
//!
//! Predators climb the prey-density gradient when prey is in reach and
//! fall back to a persistent random walk otherwise. They feed on the prey
//! count at their cell and reproduce into free slots of the (pre-cleared)
//! output buffer.

use crate::agents::steering::{
    integrate, place_child, smooth_velocity, spawn_child, terrain_drift, SpawnRequest,
};
use crate::agents::{AgentPool, STATE_FREE};
use crate::config::Config;
use crate::fields::{DensityGrid, ScalarField};
use crate::math::{length, safe_normalize};
use crate::rng::SlotRng;
use rayon::prelude::*;
use std::f32::consts::{PI, TAU};

/// Advance every predator slot one step.
///
/// The movement/energy pass runs in parallel (each slot writes only its
/// own output record); child placement then runs sequentially in slot
/// order, so results do not depend on thread scheduling.
pub fn update(
    pool: &mut AgentPool,
    prey_density: &DensityGrid,
    terrain: &ScalarField,
    cfg: &Config,
    time: f64,
) {
    let pc = &cfg.predator;
    let tc = &cfg.terrain;
    let width = cfg.grid.width;
    let height = cfg.grid.height;
    let dt = cfg.sim.delta_time;
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;
    let drift_on = tc.enabled && tc.drift_strength > 0.0;
    let capacity = pool.capacity();

    let (input, output) = pool.split();

    let requests: Vec<Option<SpawnRequest>> = output
        .par_iter_mut()
        .enumerate()
        .map(|(i, out)| {
            let mut a = input[i];
            if a.state == STATE_FREE {
                return None;
            }
            if a.x.is_nan() || a.y.is_nan() {
                a.state = STATE_FREE;
                *out = a;
                return None;
            }

            a.x = a.x.clamp(0.0, max_x);
            a.y = a.y.clamp(0.0, max_y);
            let xi = a.x as usize;
            let yi = a.y as usize;

            let count_here = prey_density.get(xi, yi) as f32;
            let (gx, gy) = prey_density.gradient(xi, yi);
            let grad_strength = length(gx, gy);
            let has_prey = count_here > 0.0 || grad_strength > 0.0;

            let mut rng = SlotRng::new(i as u32, time);
            let r0 = rng.next_f32();
            let r1 = rng.next_f32();
            let r2 = rng.next_f32();

            let noise_angle = r2 * TAU;
            let nx = noise_angle.cos() * pc.noise_strength;
            let ny = noise_angle.sin() * pc.noise_strength;

            let (mut dx, mut dy);
            if has_prey {
                // Chase: gradient pull, with noise fading as the signal
                // sharpens.
                let (ux, uy) = safe_normalize(gx, gy);
                let fade = 1.0 - (grad_strength * 0.5).clamp(0.0, 1.0);
                let (sx, sy) = safe_normalize(
                    pc.bias_strength * ux + nx * fade,
                    pc.bias_strength * uy + ny * fade,
                );
                dx = sx * pc.speed;
                dy = sy * pc.speed;
            } else {
                // Patrol: persistent heading with occasional sharp turns.
                if r0 < 0.03 {
                    a.heading += (r1 * 2.0 - 1.0) * PI;
                }
                dx = a.heading.cos() * pc.speed + 0.5 * nx * pc.speed;
                dy = a.heading.sin() * pc.speed + 0.5 * ny * pc.speed;
            }

            if drift_on {
                let (tx, ty) = terrain_drift(terrain, xi, yi, tc);
                dx += tx;
                dy += ty;
            }

            smooth_velocity(&mut a, (dx, dy), pc.friction, pc.speed, dt);
            integrate(&mut a, width, height, dt);

            a.energy -= pc.energy_decay_rate * dt;
            if pc.eat_enabled {
                a.energy += pc.eat_amount * dt * count_here.clamp(0.0, 4.0) * pc.energy_from_eat;
            }

            let mut request = None;
            if pc.reproduce_enabled && a.energy >= pc.reproduce_threshold {
                a.energy *= 0.5;
                let child = spawn_child(&a, &mut rng, r1, r2, pc.spawn_radius, pc.speed, width, height);
                request = Some(SpawnRequest {
                    start: (r0 * capacity as f32) as usize,
                    child,
                });
            }

            a.energy = a.energy.min(pc.max_energy);
            if a.energy < pc.min_energy {
                a.state = STATE_FREE;
            }
            *out = a;
            request
        })
        .collect();

    let mut claimed = vec![false; capacity];
    for request in requests.iter().flatten() {
        place_child(request, input, output, &mut claimed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, STATE_ACTIVE, SPECIES_PREDATOR};

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.grid.width = 32;
        cfg.grid.height = 32;
        cfg.terrain.enabled = false;
        cfg.predator.capacity = 16;
        cfg.predator.friction = 0.0;
        cfg.predator.noise_strength = 0.0;
        cfg.predator.eat_enabled = false;
        cfg.predator.reproduce_enabled = false;
        cfg.predator.energy_decay_rate = 0.0;
        cfg.sim.delta_time = 0.1;
        cfg
    }

    fn pool_with(cfg: &Config, agents: &[Agent]) -> AgentPool {
        let mut pool = AgentPool::new(cfg.predator.capacity);
        {
            let (_, next) = pool.split();
            for (i, a) in agents.iter().enumerate() {
                next[i] = *a;
            }
        }
        pool.swap();
        pool
    }

    fn one(x: f32, y: f32, energy: f32) -> Agent {
        Agent {
            x,
            y,
            energy,
            species: SPECIES_PREDATOR,
            state: STATE_ACTIVE,
            ..Agent::default()
        }
    }

    fn run(cfg: &Config, pool: &mut AgentPool, density: &DensityGrid) {
        let terrain = ScalarField::new(cfg.grid.width, cfg.grid.height, 0.0);
        pool.clear_next();
        update(pool, density, &terrain, cfg, 1.0);
        pool.swap();
    }

    #[test]
    fn test_nan_position_kills_slot() {
        let cfg = test_config();
        let mut pool = pool_with(&cfg, &[one(f32::NAN, 4.0, 1.0)]);
        let density = DensityGrid::new(32, 32);
        run(&cfg, &mut pool, &density);
        assert_eq!(pool.alive(), 0);
    }

    #[test]
    fn test_energy_decay_and_death() {
        let mut cfg = test_config();
        cfg.predator.energy_decay_rate = 1.0;
        cfg.predator.min_energy = 0.5;

        let mut pool = pool_with(&cfg, &[one(4.0, 4.0, 0.55)]);
        let density = DensityGrid::new(32, 32);
        run(&cfg, &mut pool, &density);
        // 0.55 - 1.0*0.1 = 0.45 < 0.5: dead.
        assert_eq!(pool.alive(), 0);
    }

    #[test]
    fn test_eating_gains_energy() {
        let mut cfg = test_config();
        cfg.predator.eat_enabled = true;
        cfg.predator.eat_amount = 1.0;
        cfg.predator.energy_from_eat = 1.0;

        let density = DensityGrid::new(32, 32);
        for _ in 0..3 {
            density.add(4, 4);
        }
        let mut pool = pool_with(&cfg, &[one(4.0, 4.0, 1.0)]);
        run(&cfg, &mut pool, &density);

        let a = pool.read().iter().find(|a| a.is_active()).unwrap();
        assert!((a.energy - (1.0 + 1.0 * 0.1 * 3.0)).abs() < 1e-5);
    }

    #[test]
    fn test_climbs_prey_gradient() {
        let mut cfg = test_config();
        cfg.predator.bias_strength = 2.0;
        cfg.predator.friction = 10.0;
        cfg.predator.speed = 5.0;

        // Dense prey column to the right of the predator.
        let density = DensityGrid::new(32, 32);
        for y in 0..32 {
            for _ in 0..8 {
                density.add(20, y);
            }
        }
        let mut pool = pool_with(&cfg, &[one(19.0, 16.0, 1.0)]);
        run(&cfg, &mut pool, &density);

        let a = pool.read().iter().find(|a| a.is_active()).unwrap();
        assert!(a.vx > 0.0, "should accelerate toward the prey column");
    }

    #[test]
    fn test_reproduction_splits_energy() {
        let mut cfg = test_config();
        cfg.predator.reproduce_enabled = true;
        cfg.predator.reproduce_threshold = 1.0;
        cfg.predator.max_energy = 5.0;

        let mut pool = pool_with(&cfg, &[one(8.0, 8.0, 2.0)]);
        let density = DensityGrid::new(32, 32);
        run(&cfg, &mut pool, &density);

        assert_eq!(pool.alive(), 2);
        for a in pool.read().iter().filter(|a| a.is_active()) {
            assert!((a.energy - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reproduction_capped_by_capacity() {
        let mut cfg = test_config();
        cfg.predator.reproduce_enabled = true;
        cfg.predator.reproduce_threshold = 0.1;
        cfg.predator.max_energy = 10.0;

        let agents: Vec<Agent> = (0..16).map(|i| one(i as f32, 4.0, 9.0)).collect();
        let mut pool = pool_with(&cfg, &agents);
        let density = DensityGrid::new(32, 32);
        run(&cfg, &mut pool, &density);

        // Every slot was already active: no room for children.
        assert_eq!(pool.alive(), 16);
    }

    #[test]
    fn test_positions_stay_in_grid() {
        let mut cfg = test_config();
        cfg.predator.noise_strength = 1.0;
        cfg.predator.speed = 50.0;
        cfg.sim.delta_time = 0.5;

        let agents: Vec<Agent> = (0..8).map(|i| one(30.0, 30.0 - i as f32, 1.0)).collect();
        let mut pool = pool_with(&cfg, &agents);
        let density = DensityGrid::new(32, 32);
        for _ in 0..20 {
            run(&cfg, &mut pool, &density);
        }
        for a in pool.read().iter().filter(|a| a.is_active()) {
            assert!(a.x >= 0.0 && a.x <= 31.0);
            assert!(a.y >= 0.0 && a.y <= 31.0);
        }
    }
}
