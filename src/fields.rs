//! Grid buffers: scalar fields, ping-pong pairs, and density grids.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// A 2D scalar field stored as a flat row-major `Vec<f32>`.
///
/// Cell `(x, y)` lives at index `y * width + x`. All neighbour access is
/// clamped to the grid (zero-flux boundary), so stencil code never has to
/// special-case the edges.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScalarField {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ScalarField {
    /// Create a field filled with a constant value.
    pub fn new(width: usize, height: usize, fill: f32) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    /// Sample with coordinates clamped into the grid.
    #[inline]
    pub fn sample(&self, x: i64, y: i64) -> f32 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[cy * self.width + cx]
    }

    /// 4-neighbour Laplacian with clamped boundaries.
    #[inline]
    pub fn laplacian(&self, x: usize, y: usize) -> f32 {
        let (xi, yi) = (x as i64, y as i64);
        let c = self.get(x, y);
        self.sample(xi - 1, yi) + self.sample(xi + 1, yi) + self.sample(xi, yi - 1)
            + self.sample(xi, yi + 1)
            - 4.0 * c
    }

    /// Central-difference gradient with clamped boundaries.
    #[inline]
    pub fn gradient(&self, x: usize, y: usize) -> (f32, f32) {
        let (xi, yi) = (x as i64, y as i64);
        let gx = (self.sample(xi + 1, yi) - self.sample(xi - 1, yi)) * 0.5;
        let gy = (self.sample(xi, yi + 1) - self.sample(xi, yi - 1)) * 0.5;
        (gx, gy)
    }

    /// Steepest absolute height difference to any 4-neighbour.
    ///
    /// Used as the talus criterion: a symmetric spike has a zero central
    /// difference at its apex but a large neighbour drop.
    #[inline]
    pub fn steepest_step(&self, x: usize, y: usize) -> f32 {
        let (xi, yi) = (x as i64, y as i64);
        let c = self.get(x, y);
        let mut s: f32 = 0.0;
        s = s.max((c - self.sample(xi - 1, yi)).abs());
        s = s.max((c - self.sample(xi + 1, yi)).abs());
        s = s.max((c - self.sample(xi, yi - 1)).abs());
        s = s.max((c - self.sample(xi, yi + 1)).abs());
        s
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    pub fn average(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum() / self.data.len() as f64
        }
    }

    /// True if every cell is finite and inside `[lo, hi]`.
    pub fn in_range(&self, lo: f32, hi: f32) -> bool {
        self.data.iter().all(|v| v.is_finite() && *v >= lo && *v <= hi)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// Double-buffered field: kernels read `read()` and write `write()`, then
/// the scheduler flips the pair.
///
/// While a kernel runs, the read buffer is guaranteed untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingPong {
    bufs: [ScalarField; 2],
    current: usize,
}

impl PingPong {
    /// Both copies start as clones of the same initial field.
    pub fn new(initial: ScalarField) -> Self {
        Self {
            bufs: [initial.clone(), initial],
            current: 0,
        }
    }

    #[inline]
    pub fn read(&self) -> &ScalarField {
        &self.bufs[self.current]
    }

    /// Borrow the read and write halves simultaneously.
    pub fn split(&mut self) -> (&ScalarField, &mut ScalarField) {
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

    /// Reset both copies to a constant and zero the flip index.
    pub fn reset(&mut self, value: f32) {
        self.bufs[0].fill(value);
        self.bufs[1].fill(value);
        self.current = 0;
    }
}

/// Integer per-cell agent counts, built by a parallel scatter.
///
/// Cells are atomic because many agents can land in one cell concurrently;
/// integer addition is associative, so scatter results are exact regardless
/// of thread interleaving.
#[derive(Debug)]
pub struct DensityGrid {
    width: usize,
    height: usize,
    cells: Vec<AtomicU32>,
}

impl DensityGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: (0..width * height).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&self) {
        for cell in &self.cells {
            cell.store(0, Ordering::Relaxed);
        }
    }

    /// Atomically count one agent into `(x, y)`.
    #[inline]
    pub fn add(&self, x: usize, y: usize) {
        self.cells[y * self.width + x].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.width + x].load(Ordering::Relaxed)
    }

    /// Sample with coordinates clamped into the grid.
    #[inline]
    pub fn sample(&self, x: i64, y: i64) -> u32 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.cells[cy * self.width + cx].load(Ordering::Relaxed)
    }

    /// Central-difference gradient of the counts.
    #[inline]
    pub fn gradient(&self, x: usize, y: usize) -> (f32, f32) {
        let (xi, yi) = (x as i64, y as i64);
        let gx = (self.sample(xi + 1, yi) as f32 - self.sample(xi - 1, yi) as f32) * 0.5;
        let gy = (self.sample(xi, yi + 1) as f32 - self.sample(xi, yi - 1) as f32) * 0.5;
        (gx, gy)
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed) as u64).sum()
    }

    /// Copy counts out for snapshots.
    pub fn to_vec(&self) -> Vec<u32> {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}
