//! Toroidal pheromone field.

use crate::utils::{clamp, floor_cell, scan_radius, wrap};
use anyhow::{Result, bail};
use rayon::prelude::*;

/// Factor applied to every cell after the 3x3 blur.
pub const DIFFUSION_BLEND: f32 = 0.98;

/// Values below this are snapped to zero after decay.
pub const DECAY_FLOOR: f32 = 0.01;

/// Scalar grid whose edges wrap in both directions.
///
/// Cells are stored row-major. A second buffer of the same shape is kept
/// as diffusion scratch space and swapped with the current one each pass.
#[derive(Debug, Clone)]
pub struct PheromoneField {
    width: usize,
    height: usize,
    cells: Vec<f32>,
    scratch: Vec<f32>,
}

impl PheromoneField {
    /// Create a zero-filled field.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![0.0; width * height],
            scratch: vec![0.0; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Current cell values, row-major.
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    #[inline]
    fn index(&self, row: i64, col: i64) -> usize {
        wrap(row, self.height) * self.width + wrap(col, self.width)
    }

    pub fn get(&self, row: i64, col: i64) -> f32 {
        self.cells[self.index(row, col)]
    }

    pub fn set(&mut self, row: i64, col: i64, val: f32) {
        let idx = self.index(row, col);
        self.cells[idx] = val;
    }

    /// Overwrite the cell containing the continuous point `(x, y)`.
    pub fn deposit(&mut self, x: f64, y: f64, val: f32) {
        self.set(floor_cell(y), floor_cell(x), val);
    }

    /// Add `delta` to every cell within `radius` of the cell containing `(x, y)`,
    /// clamping results to `[0, 1]`.
    ///
    /// Radii beyond the field extent are capped with [`scan_radius`].
    pub fn edit_region(&mut self, x: f64, y: f64, radius: u32, delta: f32) {
        let r_center = floor_cell(y);
        let c_center = floor_cell(x);
        let radius = scan_radius(radius, self.width, self.height);
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                if dr * dr + dc * dc > radius * radius {
                    continue;
                }
                let (row, col) = (r_center + dr, c_center + dc);
                let val = clamp((self.get(row, col) + delta) as f64, 0.0, 1.0);
                self.set(row, col, val as f32);
            }
        }
    }

    /// Blur every cell with the normalized kernel
    /// `[[1,2,1],[2,4,2],[1,2,1]] / 16` and scale by [`DIFFUSION_BLEND`].
    pub fn diffuse(&mut self) {
        let (width, height) = (self.width, self.height);
        let cells = &self.cells;
        self.scratch
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(r, out)| {
                let up = wrap(r as i64 - 1, height) * width;
                let mid = r * width;
                let dn = wrap(r as i64 + 1, height) * width;
                for c in 0..width {
                    let lt = wrap(c as i64 - 1, width);
                    let rt = wrap(c as i64 + 1, width);
                    let sum = cells[up + lt]
                        + 2.0 * cells[up + c]
                        + cells[up + rt]
                        + 2.0 * cells[mid + lt]
                        + 4.0 * cells[mid + c]
                        + 2.0 * cells[mid + rt]
                        + cells[dn + lt]
                        + 2.0 * cells[dn + c]
                        + cells[dn + rt];
                    out[c] = sum / 16.0 * DIFFUSION_BLEND;
                }
            });
        std::mem::swap(&mut self.cells, &mut self.scratch);
    }

    /// Multiply every cell by `rate`, snapping results below [`DECAY_FLOOR`] to zero.
    pub fn decay(&mut self, rate: f32) {
        self.cells.par_iter_mut().for_each(|cell| {
            *cell *= rate;
            if *cell < DECAY_FLOOR {
                *cell = 0.0;
            }
        });
    }

    /// Change the field dimensions, keeping the overlapping top-left region.
    ///
    /// # Errors
    /// Returns an error if either new dimension is zero.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        check_dims(width, height)?;

        let mut cells = vec![0.0; width * height];
        let n_cols = self.width.min(width);
        for r in 0..self.height.min(height) {
            let src = r * self.width;
            let dst = r * width;
            cells[dst..dst + n_cols].copy_from_slice(&self.cells[src..src + n_cols]);
        }

        self.cells = cells;
        self.scratch = vec![0.0; width * height];
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Mean cell value.
    pub fn mean(&self) -> f64 {
        self.cells.iter().map(|&v| v as f64).sum::<f64>() / self.cells.len() as f64
    }

    /// Largest cell value.
    pub fn peak(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }

    /// Fraction of cells holding any pheromone.
    pub fn coverage(&self) -> f64 {
        let n_marked = self.cells.iter().filter(|&&v| v > 0.0).count();
        n_marked as f64 / self.cells.len() as f64
    }
}

fn check_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        bail!("field dimensions must be at least 1x1, but are {width}x{height}");
    }
    Ok(())
}
