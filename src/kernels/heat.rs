//! Heat kernel: waste-flux production with decay, then a separate
//! diffusion pass.
//!
//! Production and diffusion are split into two dispatches (with a buffer
//! flip between them) so the nonlinear source and the linear smoothing can
//! be tuned for stability independently.

use crate::config::Config;
use crate::fields::ScalarField;
use crate::kernels::reaction_flux;
use rayon::prelude::*;

/// Production pass: credit the waste fraction of the reaction flux, apply
/// linear decay. Clamped into [0, 10].
pub fn update(
    cur: &ScalarField,
    reductant: &ScalarField,
    oxidant: &ScalarField,
    mat: &ScalarField,
    next: &mut ScalarField,
    cfg: &Config,
) {
    let w = cur.width();
    let hc = &cfg.heat;
    let rate = cfg.oxidant.reaction_rate;
    let dt = cfg.sim.delta_time;

    next.as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, out)| {
            let x = i % w;
            let y = i / w;
            let h = cur.get(x, y);
            let flux = reaction_flux(reductant.get(x, y), oxidant.get(x, y), mat.get(x, y), rate, dt);
            *out = (h + flux.waste * dt - h * hc.decay_rate * dt).clamp(0.0, 10.0);
        });
}

/// Diffusion pass over the freshly-produced heat.
pub fn diffuse(cur: &ScalarField, next: &mut ScalarField, cfg: &Config) {
    let w = cur.width();
    let rate = cfg.heat.diffusion_rate;
    let dt = cfg.sim.delta_time;

    next.as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, out)| {
            let x = i % w;
            let y = i / w;
            let h = cur.get(x, y);
            *out = (h + rate * cur.laplacian(x, y) * dt).clamp(0.0, 10.0);
        });
}
