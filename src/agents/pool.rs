//! Double-buffered agent pool with a fixed slot capacity.

use crate::agents::{Agent, STATE_ACTIVE, STATE_FREE};
use crate::fields::DensityGrid;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed-capacity pool of agent slots, double buffered.
///
/// Update kernels read the current buffer and write the next one; the
/// scheduler flips the pair afterwards. The next buffer is cleared before
/// each update so a stale record can never masquerade as a live agent or
/// as a free reproduction target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentPool {
    bufs: [Vec<Agent>; 2],
    current: usize,
    capacity: usize,
}

impl AgentPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            bufs: [
                vec![Agent::default(); capacity],
                vec![Agent::default(); capacity],
            ],
            current: 0,
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn read(&self) -> &[Agent] {
        &self.bufs[self.current]
    }

    /// Borrow the read and write halves simultaneously.
    pub fn split(&mut self) -> (&[Agent], &mut [Agent]) {
        let (a, b) = self.bufs.split_at_mut(1);
        if self.current == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    #[inline]
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Zero-fill the write buffer (all slots free).
    pub fn clear_next(&mut self) {
        let (_, next) = self.split();
        next.fill(Agent::default());
    }

    /// Reset the pool: `count` active agents at uniform random positions
    /// with zero velocity, unit energy, and a random heading.
    pub fn seed(
        &mut self,
        count: usize,
        species: u32,
        width: usize,
        height: usize,
        rng: &mut ChaCha8Rng,
    ) {
        self.current = 0;
        for buf in &mut self.bufs {
            buf.fill(Agent::default());
        }
        let count = count.min(self.capacity);
        // Degenerate 1-cell axes still need a non-empty sample range.
        let max_x = (width as f32 - 1.0).max(f32::MIN_POSITIVE);
        let max_y = (height as f32 - 1.0).max(f32::MIN_POSITIVE);
        for slot in &mut self.bufs[0][..count] {
            *slot = Agent {
                x: rng.gen_range(0.0..max_x),
                y: rng.gen_range(0.0..max_y),
                vx: 0.0,
                vy: 0.0,
                energy: 1.0,
                species,
                state: STATE_ACTIVE,
                heading: rng.gen_range(0.0..std::f32::consts::TAU),
            };
        }
    }

    /// Count live agents in the current buffer.
    pub fn alive(&self) -> usize {
        self.read().iter().filter(|a| a.is_active()).count()
    }

    /// Scatter the current buffer into a density grid.
    ///
    /// The grid must have been cleared first; cells take concurrent atomic
    /// adds, so the per-cell counts are exact under any thread schedule.
    pub fn scatter(&self, density: &DensityGrid) {
        let w = density.width();
        let h = density.height();
        self.read().par_iter().for_each(|a| {
            if a.state != STATE_FREE {
                let xi = a.x.clamp(0.0, (w - 1) as f32) as usize;
                let yi = a.y.clamp(0.0, (h - 1) as f32) as usize;
                density.add(xi, yi);
            }
        });
    }

    /// Raw little-endian bytes of the current buffer (32 B per slot).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.read())
    }
}
