//! Bitmap encoder: turns an image into per-neuron stimulation intensities
//!
//! The input layer of the board is a 16×16 array of neurons. An image is
//! reduced to one grayscale value per neuron, and each value is mapped to an
//! activity level in `0..=max_act` (in 0.25 Hz steps) such that dark pixels
//! drive their neuron hardest and the brightest pixel drives it not at all.

use crate::{ser, GRID_SIDE};
use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Per-neuron values, indexed `[row][col]`
pub type Grid = [[u8; GRID_SIDE]; GRID_SIDE];

pub const MAX_ACT_DEFAULT: u8 = 120;

/// Load an image from disk and reduce it to an intensity grid
pub fn load(path: impl AsRef<Path>, max_act: u8) -> Result<Grid> {
    let path = path.as_ref();
    let img = image::open(path)
        .with_context(|| format!("cannot load image {}", path.display()))?;
    from_image(&img, max_act)
}

/// Grayscale, shrink to the neuron array with a smoothing filter, transpose, normalize
pub fn from_image(img: &DynamicImage, max_act: u8) -> Result<Grid> {
    let side = GRID_SIDE as u32;
    let small = image::imageops::resize(&grayscale(img), side, side, FilterType::Lanczos3);
    normalize(&transpose(&small), max_act)
}

/// ITU-R 601-2 luma, `L = (299 R + 587 G + 114 B) / 1000`, in the 16-bit
/// fixed point most imaging tools use. Alpha is ignored.
pub fn grayscale(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Read a square grayscale image into a grid with rows and columns swapped,
/// i.e. `grid[r][c]` is the pixel at `x = r, y = c`.
pub fn transpose(img: &GrayImage) -> Grid {
    let mut grid = [[0u8; GRID_SIDE]; GRID_SIDE];
    for (r, row) in grid.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = img.get_pixel(r as u32, c as u32).0[0];
        }
    }
    grid
}

/// Map pixel values to `max_act * (1 - p / max(p))`, truncated.
///
/// An all-black grid has no reference brightness and is rejected.
pub fn normalize(raw: &Grid, max_act: u8) -> Result<Grid> {
    let max = raw.iter().flatten().copied().max().unwrap_or(0);
    if max == 0 {
        bail!("blank image: every pixel is zero");
    }
    let mut grid = [[0u8; GRID_SIDE]; GRID_SIDE];
    for (out, row) in grid.iter_mut().zip(raw.iter()) {
        for (o, &p) in out.iter_mut().zip(row.iter()) {
            *o = intensity(p, max, max_act);
        }
    }
    Ok(grid)
}

#[inline]
fn intensity(p: u8, max: u8, max_act: u8) -> u8 {
    let frac = (p as f64 / max as f64).abs();
    (max_act as f64 * (1.0 - frac)) as u8
}

/// Load the image at `path` and write it to the board as `(address, value)` pairs.
/// Returns the number of pairs sent.
pub fn send(wtr: &mut impl Write, path: impl AsRef<Path>, max_act: u8) -> Result<usize> {
    let grid = load(path, max_act)?;
    let n = ser::write_grid(wtr, &grid)?;
    debug!(pairs = n, "image sent");
    Ok(n)
}
