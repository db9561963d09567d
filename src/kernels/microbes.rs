//! Microbial mat kernel: logistic growth on feed with a carrying capacity
//! set by the slow feed average, plus the in-place feed bookkeeping.

use crate::config::Config;
use crate::fields::ScalarField;
use rayon::prelude::*;

/// Advance M one step; consume feed for growth and advance the slow
/// feed average in place.
pub fn update(
    cur: &ScalarField,
    next: &mut ScalarField,
    feed: &mut ScalarField,
    feed_avg: &mut ScalarField,
    cfg: &Config,
) {
    let mc = &cfg.mat;
    let dt = cfg.sim.delta_time;

    next.as_mut_slice()
        .par_iter_mut()
        .zip(feed.as_mut_slice().par_iter_mut())
        .zip(feed_avg.as_mut_slice().par_iter_mut())
        .zip(cur.as_slice().par_iter())
        .for_each(|(((out, b), b_avg), &m)| {
            let capacity = (mc.capacity_base + mc.capacity_alpha * *b_avg).max(0.001);
            let growth = mc.grow_rate * *b * (1.0 - m / capacity);
            let death = mc.death_rate * m;
            let dm = (growth - death) * dt;

            // Growth costs feed; shrinkage refunds nothing.
            let consume = (dm.max(0.0) * mc.yield_factor).min(*b);
            *b = (*b - consume).clamp(0.0, 10.0);
            *b_avg = (*b_avg + mc.feed_avg_rate * (*b - *b_avg) * dt).clamp(0.0, 10.0);
            *out = (m + dm).clamp(0.0, 10.0);
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut cfg = Config::default();
        cfg.mat.grow_rate = 0.0;
        cfg.mat.death_rate = 0.0;
        cfg.mat.feed_avg_rate = 0.0;
        cfg.mat.yield_factor = 0.0;
        cfg.sim.delta_time = 0.1;
        cfg
    }

    fn run_once(cfg: &Config, m: f32, b: f32, b_avg: f32) -> (f32, f32, f32) {
        let cur = ScalarField::new(8, 8, m);
        let mut next = ScalarField::new(8, 8, 0.0);
        let mut feed = ScalarField::new(8, 8, b);
        let mut feed_avg = ScalarField::new(8, 8, b_avg);
        update(&cur, &mut next, &mut feed, &mut feed_avg, cfg);
        (next.get(4, 4), feed.get(4, 4), feed_avg.get(4, 4))
    }

    #[test]
    fn test_inert_is_identity() {
        let cfg = quiet_config();
        let (m, b, b_avg) = run_once(&cfg, 0.5, 0.3, 0.2);
        assert_eq!(m, 0.5);
        assert_eq!(b, 0.3);
        assert_eq!(b_avg, 0.2);
    }

    #[test]
    fn test_growth_consumes_feed() {
        let mut cfg = quiet_config();
        cfg.mat.grow_rate = 1.0;
        cfg.mat.yield_factor = 0.5;
        cfg.mat.capacity_base = 1.0;
        cfg.mat.capacity_alpha = 0.0;

        let (m, b, _) = run_once(&cfg, 0.0, 1.0, 0.0);
        // dm = 1.0 * 1.0 * (1 - 0) * 0.1 = 0.1
        assert!((m - 0.1).abs() < 1e-6);
        assert!((b - (1.0 - 0.05)).abs() < 1e-6);
    }

    #[test]
    fn test_death_shrinks_mat() {
        let mut cfg = quiet_config();
        cfg.mat.death_rate = 0.5;

        let (m, _, _) = run_once(&cfg, 1.0, 0.0, 0.0);
        assert!((m - (1.0 - 0.5 * 0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_limits_growth() {
        let mut cfg = quiet_config();
        cfg.mat.grow_rate = 1.0;
        cfg.mat.capacity_base = 0.5;
        cfg.mat.capacity_alpha = 0.0;

        // Above capacity, the logistic term turns negative.
        let (m, _, _) = run_once(&cfg, 1.0, 1.0, 0.0);
        assert!(m < 1.0);
    }

    #[test]
    fn test_feed_avg_tracks_feed() {
        let mut cfg = quiet_config();
        cfg.mat.feed_avg_rate = 1.0;

        let (_, _, b_avg) = run_once(&cfg, 0.0, 1.0, 0.0);
        assert!((b_avg - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_consumption_capped_by_feed() {
        let mut cfg = quiet_config();
        cfg.mat.grow_rate = 100.0;
        cfg.mat.yield_factor = 10.0;
        cfg.mat.capacity_base = 10.0;

        let (_, b, _) = run_once(&cfg, 0.0, 0.05, 0.0);
        assert!(b >= 0.0);
    }
}
