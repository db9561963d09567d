//! Overlap kernel: the derived field C = R * O.
//!
//! Not advanced in time; recomputed from scratch each step after R and O
//! have both been updated.

use crate::fields::ScalarField;
use rayon::prelude::*;

pub fn compute(reductant: &ScalarField, oxidant: &ScalarField, overlap: &mut ScalarField) {
    overlap
        .as_mut_slice()
        .par_iter_mut()
        .zip(reductant.as_slice().par_iter())
        .zip(oxidant.as_slice().par_iter())
        .for_each(|((c, &r), &o)| {
            *c = r * o;
        });
}
