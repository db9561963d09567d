//! Motion and reproduction helpers shared by the prey and predator kernels.

use crate::agents::{Agent, STATE_ACTIVE, STATE_FREE};
use crate::config::TerrainConfig;
use crate::fields::ScalarField;
use crate::math::length;
use crate::rng::SlotRng;
use std::f32::consts::TAU;

/// Downslope drift added to an agent's desired velocity.
#[inline]
pub(crate) fn terrain_drift(
    terrain: &ScalarField,
    x: usize,
    y: usize,
    tc: &TerrainConfig,
) -> (f32, f32) {
    let (zx, zy) = terrain.gradient(x, y);
    let scale = tc.drift_strength / tc.reference_height.max(1e-6);
    (-scale * zx, -scale * zy)
}

/// Exponential smoothing of velocity toward `desired`, with a hard cap at
/// twice the cruise speed.
#[inline]
pub(crate) fn smooth_velocity(
    agent: &mut Agent,
    desired: (f32, f32),
    friction: f32,
    speed: f32,
    dt: f32,
) {
    let damp = (1.0 - friction * dt).clamp(0.0, 1.0);
    agent.vx = damp * agent.vx + (1.0 - damp) * desired.0;
    agent.vy = damp * agent.vy + (1.0 - damp) * desired.1;

    let limit = 2.0 * speed;
    let len = length(agent.vx, agent.vy);
    if len > limit && len > 0.0 {
        agent.vx *= limit / len;
        agent.vy *= limit / len;
    }
}

/// Integrate position and mirror-reflect off the walls.
///
/// A reflection flips the offending velocity component, damps the whole
/// velocity by 0.7, and re-aims the persistent heading along the new
/// velocity. The final position is clamped into the grid.
pub(crate) fn integrate(agent: &mut Agent, width: usize, height: usize, dt: f32) {
    agent.x += agent.vx * dt;
    agent.y += agent.vy * dt;

    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;
    let mut reflected = false;

    if agent.x < 0.0 {
        agent.x = -agent.x;
        agent.vx = -agent.vx;
        reflected = true;
    } else if agent.x > max_x {
        agent.x = 2.0 * max_x - agent.x;
        agent.vx = -agent.vx;
        reflected = true;
    }
    if agent.y < 0.0 {
        agent.y = -agent.y;
        agent.vy = -agent.vy;
        reflected = true;
    } else if agent.y > max_y {
        agent.y = 2.0 * max_y - agent.y;
        agent.vy = -agent.vy;
        reflected = true;
    }

    if reflected {
        agent.vx *= 0.7;
        agent.vy *= 0.7;
        agent.heading = agent.vy.atan2(agent.vx);
    }

    agent.x = agent.x.clamp(0.0, max_x);
    agent.y = agent.y.clamp(0.0, max_y);
}

/// A child record waiting for a free slot, plus where to start probing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SpawnRequest {
    pub start: usize,
    pub child: Agent,
}

/// Build a child next to its parent.
///
/// The parent's energy must already be halved; the child inherits the
/// halved value. Spawn offset and velocity jitter come from the parent's
/// per-step generator, so placement is reproducible.
pub(crate) fn spawn_child(
    parent: &Agent,
    rng: &mut SlotRng,
    r1: f32,
    r2: f32,
    spawn_radius: f32,
    speed: f32,
    width: usize,
    height: usize,
) -> Agent {
    let angle = r1 * TAU;
    let dist = spawn_radius * (0.5 + r2 * 0.5);
    let jitter = 0.3 * speed;

    Agent {
        x: (parent.x + angle.cos() * dist).clamp(0.0, (width - 1) as f32),
        y: (parent.y + angle.sin() * dist).clamp(0.0, (height - 1) as f32),
        vx: parent.vx * 0.5 + rng.next_signed() * jitter,
        vy: parent.vy * 0.5 + rng.next_signed() * jitter,
        energy: parent.energy,
        species: parent.species,
        state: STATE_ACTIVE,
        heading: angle,
    }
}

/// Probe stride for the reproduction slot search. Coprime with any
/// realistic capacity, so eight probes touch eight distinct slots.
const PROBE_STRIDE: usize = 1237;

/// Place a child into the output buffer.
///
/// Probes up to eight candidate slots; a slot is free when the *input*
/// buffer marks it free and no earlier parent claimed it this step. On
/// failure the request is dropped and the parent keeps its halved energy,
/// which acts as a natural population cap.
pub(crate) fn place_child(
    request: &SpawnRequest,
    input: &[Agent],
    output: &mut [Agent],
    claimed: &mut [bool],
) -> bool {
    let capacity = input.len();
    for k in 0..8 {
        let cand = (request.start + k * PROBE_STRIDE) % capacity;
        if input[cand].state == STATE_FREE && !claimed[cand] {
            output[cand] = request.child;
            claimed[cand] = true;
            return true;
        }
    }
    false
}
