//! Terrain kernel: chimney growth and decay.
//!
//! Waste flux and standing biomass deposit material; the reductant flow
//! erodes it (more aggressively at height, and only where sediment sits
//! above bedrock); linear diffusion and talus creep relax the slopes.

use crate::config::Config;
use crate::fields::ScalarField;
use crate::kernels::reaction_flux;
use rayon::prelude::*;

#[allow(clippy::too_many_arguments)]
pub fn update(
    cur: &ScalarField,
    bedrock: &ScalarField,
    reductant: &ScalarField,
    oxidant: &ScalarField,
    mat: &ScalarField,
    feed_avg: &ScalarField,
    next: &mut ScalarField,
    cfg: &Config,
) {
    let w = cur.width();
    let tc = &cfg.terrain;
    let dt = cfg.sim.delta_time;
    let rate = cfg.oxidant.reaction_rate;

    if !tc.enabled {
        next.as_mut_slice().copy_from_slice(cur.as_slice());
        return;
    }

    let ref_height = tc.reference_height.max(1e-6);

    next.as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, out)| {
            let x = i % w;
            let y = i / w;
            let z = cur.get(x, y);
            let floor = bedrock.get(x, y);

            let lap = cur.laplacian(x, y);
            let slope = cur.steepest_step(x, y);
            let (rx, ry) = reductant.gradient(x, y);
            let flow = (rx * rx + ry * ry).sqrt();

            let flux = reaction_flux(reductant.get(x, y), oxidant.get(x, y), mat.get(x, y), rate, dt);
            let deposit = tc.deposition_rate * flux.waste * dt
                + tc.bio_deposition_rate * feed_avg.get(x, y).max(0.0) * dt;

            let height_boost =
                1.0 + tc.height_erosion_alpha * (1.0 - (-z.max(0.0) / ref_height).exp());
            let sediment = (z - floor).max(0.0);
            let sediment_factor = (sediment / ref_height).clamp(0.0, 1.0);
            let erosion = tc.erosion_rate * flow * height_boost * sediment_factor * dt;

            let smoothing = tc.diffusion_rate * lap * dt;

            let thermal = if tc.thermal_enabled {
                tc.thermal_rate * (slope - tc.talus_slope).max(0.0) * lap * dt
            } else {
                0.0
            };

            *out = (z + deposit - erosion + smoothing + thermal)
                .max(floor)
                .min(1000.0);
        });
}
