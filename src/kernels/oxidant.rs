//! Oxidant kernel: relaxation toward background, diffusion, terrain
//! advection, and the R*O reaction with its waste/fixed split.
//!
//! This is the only kernel that credits the feed pool from the reaction;
//! the feed also takes its natural decay here, in the same pass.

use crate::config::Config;
use crate::fields::ScalarField;
use crate::kernels::{flow_advection, reaction_flux};
use rayon::prelude::*;

/// Advance O one step and fold the fixed reaction flux into the feed pool.
pub fn update(
    cur: &ScalarField,
    reductant: &ScalarField,
    mat: &ScalarField,
    terrain: &ScalarField,
    next: &mut ScalarField,
    feed: &mut ScalarField,
    cfg: &Config,
) {
    let w = cur.width();
    let oc = &cfg.oxidant;
    let tc = &cfg.terrain;
    let dt = cfg.sim.delta_time;
    let feed_decay = cfg.mat.feed_decay_rate;
    let terrain_flow = tc.enabled && tc.flow_strength > 0.0;

    next.as_mut_slice()
        .par_iter_mut()
        .zip(feed.as_mut_slice().par_iter_mut())
        .enumerate()
        .for_each(|(i, (out, b))| {
            let x = i % w;
            let y = i / w;
            let o = cur.get(x, y);

            let lap = cur.laplacian(x, y);
            let mut advection = 0.0;
            if terrain_flow {
                advection += flow_advection(cur, terrain, x, y, tc.flow_strength, dt);
            }

            let flux = reaction_flux(reductant.get(x, y), o, mat.get(x, y), oc.reaction_rate, dt);

            // Two additive pulls toward the background concentration.
            let pull = (oc.relaxation_rate + oc.restore_rate) * (oc.background - o) * dt;
            let diffusion = oc.diffusion_rate * lap * dt;
            let consumption = flux.total * dt;

            *out = (o + pull + diffusion + advection - consumption).clamp(0.0, 1.0);
            *b = (*b + flux.fixed * dt - *b * feed_decay * dt).clamp(0.0, 10.0);
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut cfg = Config::default();
        cfg.grid.width = 16;
        cfg.grid.height = 16;
        cfg.oxidant.relaxation_rate = 0.0;
        cfg.oxidant.diffusion_rate = 0.0;
        cfg.oxidant.restore_rate = 0.0;
        cfg.oxidant.reaction_rate = 0.0;
        cfg.mat.feed_decay_rate = 0.0;
        cfg.terrain.enabled = false;
        cfg.sim.delta_time = 0.1;
        cfg
    }

    fn run_once(cfg: &Config, o: f32, r: f32, m: f32, b: f32) -> (f32, f32) {
        let cur = ScalarField::new(16, 16, o);
        let reductant = ScalarField::new(16, 16, r);
        let mat = ScalarField::new(16, 16, m);
        let terrain = ScalarField::new(16, 16, 0.0);
        let mut next = ScalarField::new(16, 16, 0.0);
        let mut feed = ScalarField::new(16, 16, b);
        update(&cur, &reductant, &mat, &terrain, &mut next, &mut feed, cfg);
        (next.get(8, 8), feed.get(8, 8))
    }

    #[test]
    fn test_inert_is_identity() {
        let cfg = quiet_config();
        let (o, b) = run_once(&cfg, 0.5, 0.3, 0.1, 0.2);
        assert_eq!(o, 0.5);
        assert_eq!(b, 0.2);
    }

    #[test]
    fn test_relaxes_toward_background() {
        let mut cfg = quiet_config();
        cfg.oxidant.background = 1.0;
        cfg.oxidant.relaxation_rate = 1.0;
        cfg.oxidant.restore_rate = 0.5;
        cfg.sim.delta_time = 0.01;

        let (o, _) = run_once(&cfg, 0.0, 0.0, 0.0, 0.0);
        assert!((o - 0.015).abs() < 1e-6);
    }

    #[test]
    fn test_reaction_consumes_and_feeds() {
        let mut cfg = quiet_config();
        cfg.oxidant.reaction_rate = 1.0;
        cfg.sim.delta_time = 0.001;

        let (o, b) = run_once(&cfg, 1.0, 1.0, 0.25, 0.0);
        // Consumption of O by the full flux.
        assert!((o - (1.0 - 0.001)).abs() < 1e-6);
        // Fixed fraction g = 0.25 lands in feed.
        assert!((b - 0.25 * 0.001).abs() < 1e-7);
    }

    #[test]
    fn test_reaction_never_overdraws() {
        let mut cfg = quiet_config();
        cfg.oxidant.reaction_rate = 10.0;
        cfg.sim.delta_time = 0.5;

        let (o, _) = run_once(&cfg, 0.3, 1.0, 0.0, 0.0);
        assert!(o >= 0.0);
    }

    #[test]
    fn test_feed_decay() {
        let mut cfg = quiet_config();
        cfg.mat.feed_decay_rate = 0.5;
        let (_, b) = run_once(&cfg, 0.5, 0.0, 0.0, 1.0);
        assert!((b - (1.0 - 0.5 * 0.1)).abs() < 1e-6);
    }
}
