//! Prey update kernel.
//!
//! Prey graze the feed field: they climb its gradient when it is strong
//! enough to sense, explore with a hunger-modulated random walk otherwise,
//! and lose energy to whatever predators share their cell. Eating debits
//! the feed field in place, so the consumption pass runs sequentially in
//! slot order after the parallel movement pass.

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

/// Minimum feed-gradient magnitude prey can sense.
const FOOD_SENSE_THRESHOLD: f32 = 0.002;

/// Carried from the parallel pass into the sequential commit pass.
struct Pending {
    xi: usize,
    yi: usize,
    rng: SlotRng,
    r0: f32,
    r1: f32,
    r2: f32,
}

/// Advance every prey slot one step.
pub fn update(
    pool: &mut AgentPool,
    feed: &mut ScalarField,
    predator_density: &DensityGrid,
    terrain: &ScalarField,
    cfg: &Config,
    time: f64,
) {
    let pc = &cfg.prey;
    let tc = &cfg.terrain;
    let width = cfg.grid.width;
    let height = cfg.grid.height;
    let dt = cfg.sim.delta_time;
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;
    let drift_on = tc.enabled && tc.drift_strength > 0.0;
    let capacity = pool.capacity();

    let (input, output) = pool.split();
    let feed_ref: &ScalarField = feed;

    // Parallel pass: steering, integration, decay, predation pressure.
    let pending: Vec<Option<Pending>> = output
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

            let (gx, gy) = feed_ref.gradient(xi, yi);
            let grad_strength = length(gx, gy);
            let has_food = grad_strength > FOOD_SENSE_THRESHOLD;

            let hunger = (1.0 - a.energy / pc.max_energy.max(1e-6)).clamp(0.0, 1.0);

            let mut rng = SlotRng::new(i as u32, time);
            let r0 = rng.next_f32();
            let r1 = rng.next_f32();
            let r2 = rng.next_f32();

            let noise_angle = r2 * TAU;
            let nx = noise_angle.cos() * pc.noise_strength;
            let ny = noise_angle.sin() * pc.noise_strength;

            let (mut dx, mut dy);
            if has_food {
                let (ux, uy) = safe_normalize(gx, gy);
                let fade = 1.0 - (grad_strength * 0.5).clamp(0.0, 1.0);
                let (sx, sy) = safe_normalize(
                    pc.bias_strength * ux + nx * fade,
                    pc.bias_strength * uy + ny * fade,
                );
                dx = sx * pc.speed;
                dy = sy * pc.speed;
            } else {
                // Hungrier prey turn more often and wander harder.
                let turn_chance = 0.02 + hunger * 0.08;
                if r0 < turn_chance {
                    a.heading += (r1 * 2.0 - 1.0) * PI;
                }
                let wander = 0.5 * (1.0 + hunger);
                dx = a.heading.cos() * pc.speed + wander * nx * pc.speed;
                dy = a.heading.sin() * pc.speed + wander * ny * pc.speed;
            }

            if drift_on {
                let (tx, ty) = terrain_drift(terrain, xi, yi, tc);
                dx += tx;
                dy += ty;
            }

            smooth_velocity(&mut a, (dx, dy), pc.friction, pc.speed, dt);
            integrate(&mut a, width, height, dt);

            a.energy -= pc.energy_decay_rate * dt;
            let predators_here = predator_density.get(xi, yi) as f32;
            a.energy -= cfg.predator.predation_strength * dt * predators_here;

            *out = a;
            Some(Pending {
                xi,
                yi,
                rng,
                r0,
                r1,
                r2,
            })
        })
        .collect();

    // Sequential commit pass: feed consumption, reproduction, death.
    let mut claimed = vec![false; capacity];
    for (i, entry) in pending.into_iter().enumerate() {
        let Some(mut p) = entry else { continue };
        let mut a = output[i];
        if a.state == STATE_FREE {
            continue;
        }

        if pc.eat_enabled {
            let available = feed.get(p.xi, p.yi);
            let consumed = (pc.eat_amount * dt).min(available);
            feed.set(p.xi, p.yi, available - consumed);
            a.energy += consumed * pc.energy_from_eat;
        }

        if pc.reproduce_enabled && a.energy >= pc.reproduce_threshold {
            a.energy *= 0.5;
            let child =
                spawn_child(&a, &mut p.rng, p.r1, p.r2, pc.spawn_radius, pc.speed, width, height);
            let request = SpawnRequest {
                start: (p.r0 * capacity as f32) as usize,
                child,
            };
            place_child(&request, input, output, &mut claimed);
        }

        a.energy = a.energy.min(pc.max_energy);
        if a.energy < pc.min_energy {
            a.state = STATE_FREE;
        }
        output[i] = a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, STATE_ACTIVE, SPECIES_PREY};

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.grid.width = 32;
        cfg.grid.height = 32;
        cfg.terrain.enabled = false;
        cfg.prey.capacity = 16;
        cfg.prey.friction = 0.0;
        cfg.prey.noise_strength = 0.0;
        cfg.prey.eat_enabled = false;
        cfg.prey.reproduce_enabled = false;
        cfg.prey.energy_decay_rate = 0.0;
        cfg.predator.predation_strength = 0.0;
        cfg.sim.delta_time = 0.1;
        cfg
    }

    fn pool_with(cfg: &Config, agents: &[Agent]) -> AgentPool {
        let mut pool = AgentPool::new(cfg.prey.capacity);
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
            species: SPECIES_PREY,
            state: STATE_ACTIVE,
            ..Agent::default()
        }
    }

    fn run(cfg: &Config, pool: &mut AgentPool, feed: &mut ScalarField, dp2: &DensityGrid) {
        let terrain = ScalarField::new(cfg.grid.width, cfg.grid.height, 0.0);
        pool.clear_next();
        update(pool, feed, dp2, &terrain, cfg, 1.0);
        pool.swap();
    }

    #[test]
    fn test_eats_feed_in_place() {
        let mut cfg = test_config();
        cfg.prey.eat_enabled = true;
        cfg.prey.eat_amount = 1.0;
        cfg.prey.energy_from_eat = 1.0;

        let mut feed = ScalarField::new(32, 32, 0.0);
        feed.set(4, 4, 0.5);
        let dp2 = DensityGrid::new(32, 32);
        let mut pool = pool_with(&cfg, &[one(4.0, 4.0, 1.0)]);
        run(&cfg, &mut pool, &mut feed, &dp2);

        // eat_amount * dt = 0.1 taken from the cell and turned into energy.
        assert!((feed.get(4, 4) - 0.4).abs() < 1e-6);
        let a = pool.read().iter().find(|a| a.is_active()).unwrap();
        assert!((a.energy - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_eating_capped_by_available_feed() {
        let mut cfg = test_config();
        cfg.prey.eat_enabled = true;
        cfg.prey.eat_amount = 10.0;
        cfg.prey.energy_from_eat = 1.0;
        cfg.prey.max_energy = 10.0;

        let mut feed = ScalarField::new(32, 32, 0.0);
        feed.set(4, 4, 0.3);
        let dp2 = DensityGrid::new(32, 32);
        // Two prey in the same cell drain it in slot order.
        let mut pool = pool_with(&cfg, &[one(4.0, 4.0, 1.0), one(4.0, 4.0, 1.0)]);
        run(&cfg, &mut pool, &mut feed, &dp2);

        assert_eq!(feed.get(4, 4), 0.0);
        let energies: Vec<f32> = pool
            .read()
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.energy)
            .collect();
        // First slot got the full bite, second got the remainder.
        assert!((energies[0] - 1.3).abs() < 1e-6);
        assert!((energies[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_predation_pressure() {
        let mut cfg = test_config();
        cfg.predator.predation_strength = 1.0;

        let mut feed = ScalarField::new(32, 32, 0.0);
        let dp2 = DensityGrid::new(32, 32);
        dp2.add(4, 4);
        dp2.add(4, 4);
        let mut pool = pool_with(&cfg, &[one(4.0, 4.0, 1.0)]);
        run(&cfg, &mut pool, &mut feed, &dp2);

        let a = pool.read().iter().find(|a| a.is_active()).unwrap();
        assert!((a.energy - (1.0 - 1.0 * 0.1 * 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_climbs_feed_gradient() {
        let mut cfg = test_config();
        cfg.prey.bias_strength = 2.0;
        cfg.prey.friction = 10.0;
        cfg.prey.speed = 5.0;

        let mut feed = ScalarField::new(32, 32, 0.0);
        for y in 0..32 {
            feed.set(20, y, 1.0);
        }
        let dp2 = DensityGrid::new(32, 32);
        let mut pool = pool_with(&cfg, &[one(19.0, 16.0, 1.0)]);
        run(&cfg, &mut pool, &mut feed, &dp2);

        let a = pool.read().iter().find(|a| a.is_active()).unwrap();
        assert!(a.vx > 0.0, "should accelerate toward the feed ridge");
    }

    #[test]
    fn test_starvation_death() {
        let mut cfg = test_config();
        cfg.prey.energy_decay_rate = 1.0;
        cfg.prey.min_energy = 0.1;

        let mut feed = ScalarField::new(32, 32, 0.0);
        let dp2 = DensityGrid::new(32, 32);
        let mut pool = pool_with(&cfg, &[one(4.0, 4.0, 0.15)]);
        run(&cfg, &mut pool, &mut feed, &dp2);
        assert_eq!(pool.alive(), 0);
    }

    #[test]
    fn test_reproduction_places_child() {
        let mut cfg = test_config();
        cfg.prey.reproduce_enabled = true;
        cfg.prey.reproduce_threshold = 1.0;
        cfg.prey.max_energy = 5.0;

        let mut feed = ScalarField::new(32, 32, 0.0);
        let dp2 = DensityGrid::new(32, 32);
        let mut pool = pool_with(&cfg, &[one(8.0, 8.0, 2.0)]);
        run(&cfg, &mut pool, &mut feed, &dp2);

        assert_eq!(pool.alive(), 2);
    }

    #[test]
    fn test_nan_guard() {
        let cfg = test_config();
        let mut feed = ScalarField::new(32, 32, 0.0);
        let dp2 = DensityGrid::new(32, 32);
        let mut pool = pool_with(&cfg, &[one(4.0, f32::NAN, 1.0), one(5.0, 5.0, 1.0)]);
        run(&cfg, &mut pool, &mut feed, &dp2);
        assert_eq!(pool.alive(), 1);
    }
}
