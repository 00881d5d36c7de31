use anyhow::{Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

/// Wrap an integer coordinate onto a toroidal axis of length `size`.
///
/// Returns a value in `[0, size)` congruent to `n` modulo `size`,
/// for any `n` including negatives. `size` must be non-zero.
#[inline]
pub fn wrap(n: i64, size: usize) -> usize {
    n.rem_euclid(size as i64) as usize
}

/// Floor a continuous coordinate to the integer cell containing it.
#[inline]
pub fn floor_cell(v: f64) -> i64 {
    v.floor() as i64
}

/// Largest useful scan radius for a disc on a `width` x `height` torus.
///
/// A disc of radius `max(width, height)` already reaches every cell, so
/// larger radii are capped here to keep offset arithmetic bounded.
#[inline]
pub fn scan_radius(radius: u32, width: usize, height: usize) -> i64 {
    (radius as i64).min(width.max(height) as i64)
}

/// Clamp `val` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics; NaN collapses to `min`.
pub fn clamp(val: f64, min: f64, max: f64) -> f64 {
    val.max(min).min(max)
}

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
