//! Mobile agents: fixed-capacity, double-buffered pools of prey and
//! predators.
//!
//! Both species share one 32-byte record layout so external tools can
//! inspect raw pool snapshots. A slot is either free (`state == 0`) and
//! ignored by every kernel, or active with a position inside the grid.

pub mod pool;
pub mod predator;
pub mod prey;
pub(crate) mod steering;

pub use pool::AgentPool;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Slot is unused and may be claimed by reproduction.
pub const STATE_FREE: u32 = 0;
/// Slot holds a live agent.
pub const STATE_ACTIVE: u32 = 1;

/// Species tag stored in the record.
pub const SPECIES_PREY: u32 = 0;
pub const SPECIES_PREDATOR: u32 = 1;

/// One agent slot. `#[repr(C)]`, 32 bytes, little-endian on disk.
///
/// `heading` doubles as the persistent exploration direction (radians);
/// reproduction seeds a child's heading from its spawn angle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Agent {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub energy: f32,
    pub species: u32,
    pub state: u32,
    pub heading: f32,
}

impl Agent {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != STATE_FREE
    }
}
