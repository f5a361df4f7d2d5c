//! Parameter types for image transforms.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the variant generator (which samples them from the
//! configured ranges) and the [`operations`](super::operations) module (which
//! does the pixel work). Every type validates its own range so an out-of-range
//! value surfaces as [`TransformError::InvalidParameter`] before any pixel is
//! touched.
//!
//! ## Types
//!
//! - [`FillPolicy`]: how geometric transforms fill exposed regions.
//! - [`Interpolation`]: nearest or bilinear sampling.
//! - [`Translation`], [`Rotation`] + [`RotateOptions`], [`Warp`]: geometric.
//! - [`GaussianBlur`], [`BoxBlur`]: smoothing.
//! - [`Brightness`], [`Contrast`], [`Fireflies`]: photometric.
//! - [`Quality`]: lossy encoding quality used by the writer.

use super::operations::TransformError;
use serde::{Deserialize, Serialize};

/// Rule for pixels a geometric transform exposes beyond the source edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPolicy {
    /// Every colour channel set to `level` × full scale (`level` in 0..=1),
    /// alpha fully opaque.
    Constant(f32),
    /// Replicate the nearest edge pixel.
    Clamp,
}

impl FillPolicy {
    pub fn validate(&self) -> Result<(), TransformError> {
        match *self {
            FillPolicy::Constant(level) => check_unit("fill.level", level),
            FillPolicy::Clamp => Ok(()),
        }
    }
}

impl Default for FillPolicy {
    fn default() -> Self {
        FillPolicy::Constant(0.0)
    }
}

/// Sampling used when a transform maps to non-integer source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Shift of image content in pixels. Positive `dx` moves content right,
/// positive `dy` moves it down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translation {
    pub dx: f32,
    pub dy: f32,
}

impl Translation {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_finite("translate.dx", self.dx)?;
        check_finite("translate.dy", self.dy)
    }
}

/// Counter-clockwise rotation about the image centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
}

impl Rotation {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_finite("rotate.degrees", self.degrees)
    }
}

/// How a rotation samples and sizes its output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateOptions {
    pub interpolation: Interpolation,
    pub fill: FillPolicy,
    /// Grow the canvas to hold the whole rotated image instead of cropping
    /// to the input dimensions.
    pub expand: bool,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            fill: FillPolicy::default(),
            expand: false,
        }
    }
}

/// Sinusoidal displacement of pixel coordinates.
///
/// - `amplitude`: peak displacement in pixels
/// - `frequency`: number of full periods across the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Warp {
    pub amplitude: f32,
    pub frequency: f32,
}

impl Warp {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_non_negative("warp.amplitude", self.amplitude)?;
        check_non_negative("warp.frequency", self.frequency)
    }
}

/// Gaussian blur with standard deviation `sigma` (pixels). Zero is identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    pub sigma: f32,
}

impl GaussianBlur {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_non_negative("blur.sigma", self.sigma)
    }
}

/// Mean filter over a `(2r+1)²` window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBlur {
    pub radius: f32,
}

impl BoxBlur {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_non_negative("box_blur.radius", self.radius)
    }

    /// Integer window half-width actually used.
    pub fn window(&self) -> u32 {
        self.radius.round() as u32
    }
}

/// Additive brightness offset as a fraction of full scale (-1..=1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brightness {
    pub delta: f32,
}

impl Brightness {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_finite("brightness.delta", self.delta)?;
        if !(-1.0..=1.0).contains(&self.delta) {
            return Err(TransformError::invalid(
                "brightness.delta",
                self.delta,
                "must be within -1..=1",
            ));
        }
        Ok(())
    }
}

/// Contrast scale around the mid-grey level. 1.0 is identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contrast {
    pub factor: f32,
}

impl Contrast {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_non_negative("contrast.factor", self.factor)
    }
}

/// Random grey speckles: each pixel becomes `level` grey with probability
/// `fraction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fireflies {
    pub fraction: f32,
    pub level: f32,
}

impl Fireflies {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_unit("fireflies.fraction", self.fraction)?;
        check_unit("fireflies.level", self.level)
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

fn check_finite(name: &'static str, value: f32) -> Result<(), TransformError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TransformError::invalid(name, value, "must be finite"))
    }
}

fn check_non_negative(name: &'static str, value: f32) -> Result<(), TransformError> {
    check_finite(name, value)?;
    if value < 0.0 {
        return Err(TransformError::invalid(name, value, "must not be negative"));
    }
    Ok(())
}

fn check_unit(name: &'static str, value: f32) -> Result<(), TransformError> {
    check_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(TransformError::invalid(name, value, "must be within 0..=1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn negative_blur_sigma_is_invalid() {
        let err = GaussianBlur { sigma: -0.5 }.validate().unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidParameter {
                name: "blur.sigma",
                ..
            }
        ));
    }

    #[test]
    fn zero_blur_sigma_is_valid() {
        assert!(GaussianBlur { sigma: 0.0 }.validate().is_ok());
    }

    #[test]
    fn brightness_outside_unit_range_is_invalid() {
        assert!(Brightness { delta: 1.5 }.validate().is_err());
        assert!(Brightness { delta: -1.0 }.validate().is_ok());
    }

    #[test]
    fn rotation_rejects_nan() {
        assert!(Rotation { degrees: f32::NAN }.validate().is_err());
    }

    #[test]
    fn fill_level_must_be_unit() {
        assert!(FillPolicy::Constant(0.5).validate().is_ok());
        assert!(FillPolicy::Constant(2.0).validate().is_err());
        assert!(FillPolicy::Clamp.validate().is_ok());
    }

    #[test]
    fn box_blur_window_rounds() {
        assert_eq!(BoxBlur { radius: 1.4 }.window(), 1);
        assert_eq!(BoxBlur { radius: 1.6 }.window(), 2);
    }
}
