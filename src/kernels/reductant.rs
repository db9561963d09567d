//! Reducing-substance kernel: radial vent source, diffusion, advection, decay.

use crate::config::Config;
use crate::fields::ScalarField;
use crate::kernels::flow_advection;
use crate::math::smoothstep;
use rayon::prelude::*;

/// Advance R one step.
///
/// The source is a smoothstep falloff around the vent center raised to
/// `falloff_power`; transport is 4-neighbour diffusion plus two optional
/// advection terms (a rotating background current and downslope terrain
/// flow); the sink is linear decay. The result is clamped into [0, 1].
pub fn update(
    cur: &ScalarField,
    terrain: &ScalarField,
    next: &mut ScalarField,
    cfg: &Config,
    time: f64,
) {
    let w = cur.width();
    let rc = &cfg.reductant;
    let tc = &cfg.terrain;
    let dt = cfg.sim.delta_time;

    // The background current rotates slowly with simulation time.
    let (avx, avy) = if rc.advection_enabled {
        let angle = (time * 0.5) as f32;
        let (sin, cos) = angle.sin_cos();
        (
            rc.advection_vx * cos - rc.advection_vy * sin,
            rc.advection_vx * sin + rc.advection_vy * cos,
        )
    } else {
        (0.0, 0.0)
    };
    let terrain_flow = tc.enabled && tc.flow_strength > 0.0;

    next.as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, out)| {
            let x = i % w;
            let y = i / w;
            let r = cur.get(x, y);

            let dx = x as f32 - rc.center_x;
            let dy = y as f32 - rc.center_y;
            let dist = (dx * dx + dy * dy).sqrt();
            let falloff = 1.0 - smoothstep(0.0, 1.0, dist / rc.decay_radius);
            let source = rc.max_strength * falloff.powf(rc.falloff_power);

            let lap = cur.laplacian(x, y);

            let mut advection = 0.0;
            if rc.advection_enabled {
                let (gx, gy) = cur.gradient(x, y);
                advection -= (avx * gx + avy * gy) * dt;
            }
            if terrain_flow {
                advection += flow_advection(cur, terrain, x, y, tc.flow_strength, dt);
            }

            let decay = r * rc.decay_rate * dt;

            *out = (r + source * dt + rc.diffusion_rate * lap * dt + advection - decay)
                .clamp(0.0, 1.0);
        });
}
