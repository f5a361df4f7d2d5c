//! Pure geometry for the transforms.
//!
//! Coordinates are in pixel-index space: pixel `(i, j)` sits at `(i, j)`, so
//! the centre of a `w × h` image is `((w - 1) / 2, (h - 1) / 2)`. All
//! functions here are pure and testable without any images.

use std::f64::consts::PI;

/// Centre of a `width × height` image in pixel-index space.
pub fn centre(width: u32, height: u32) -> (f64, f64) {
    (
        (width as f64 - 1.0) / 2.0,
        (height as f64 - 1.0) / 2.0,
    )
}

/// Canvas size that holds an image rotated by `degrees` without clipping.
///
/// # Examples
/// ```
/// # use simple_augment::imaging::calculations::rotated_bounds;
/// assert_eq!(rotated_bounds(100, 50, 0.0), (100, 50));
/// assert_eq!(rotated_bounds(100, 50, 90.0), (50, 100));
/// ```
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let theta = (degrees as f64).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (width as f64, height as f64);
    // Shave float noise so exact right angles don't gain a pixel
    let bw = (w * cos + h * sin - 1e-6).ceil().max(0.0);
    let bh = (w * sin + h * cos - 1e-6).ceil().max(0.0);
    (bw as u32, bh as u32)
}

/// Inverse rotation map: for an output pixel, the source coordinate it samples.
///
/// Rotation is counter-clockwise as displayed (y axis pointing down), about
/// the source centre, with the output centre aligned to it.
#[derive(Debug, Clone, Copy)]
pub struct RotationMap {
    sin: f64,
    cos: f64,
    src_centre: (f64, f64),
    dst_centre: (f64, f64),
}

impl RotationMap {
    pub fn new(src: (u32, u32), dst: (u32, u32), degrees: f32) -> Self {
        let theta = (degrees as f64).to_radians();
        Self {
            sin: theta.sin(),
            cos: theta.cos(),
            src_centre: centre(src.0, src.1),
            dst_centre: centre(dst.0, dst.1),
        }
    }

    pub fn source_of(&self, x: u32, y: u32) -> (f64, f64) {
        let dx = x as f64 - self.dst_centre.0;
        let dy = y as f64 - self.dst_centre.1;
        (
            self.src_centre.0 + dx * self.cos - dy * self.sin,
            self.src_centre.1 + dx * self.sin + dy * self.cos,
        )
    }
}

/// Sinusoidal warp: source pixel sampled by output pixel `(x, y)`.
///
/// The x offset varies along y and the y offset along x, each completing
/// `frequency` periods across the image. The result is clamped to the image
/// and truncated to integer indices.
pub fn warp_source(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    amplitude: f32,
    frequency: f32,
) -> (u32, u32) {
    let (a, f) = (amplitude as f64, frequency as f64);
    let sx = x as f64 + a * (2.0 * PI * f * y as f64 / height as f64).sin();
    let sy = y as f64 + a * (2.0 * PI * f * x as f64 / width as f64).sin();
    let sx = sx.clamp(0.0, (width - 1) as f64) as u32;
    let sy = sy.clamp(0.0, (height - 1) as f64) as u32;
    (sx, sy)
}
