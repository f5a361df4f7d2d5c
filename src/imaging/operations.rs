//! The transform library.
//!
//! Every function takes a [`DynamicImage`] plus its parameters and returns a
//! new image with the same pixel layout. Parameters are validated first, then
//! the layout is checked: 8- and 16-bit integer layouts (with or without
//! alpha) are handled, floating-point layouts are rejected with
//! [`TransformError::UnsupportedFormat`].
//!
//! | Transform | Output size | Sampling |
//! |---|---|---|
//! | [`translate`] | same | `imageproc` warp, or clamped remap |
//! | [`rotate`] | same, or expanded bounds | `imageproc` warp, or clamped remap |
//! | [`warp`] | same | clamped, truncated |
//! | [`gaussian_blur`] | same | `image::imageops::blur` |
//! | [`box_blur`] | same | separable mean, edge clamp |
//! | [`brightness`], [`contrast`] | same | per-sample, clamped |
//! | [`fireflies`] | same | per-pixel Bernoulli |
//! | [`mirror`], [`flip`] | same | exact |
//!
//! Constant fill is a projective warp through
//! `imageproc::geometric_transformations`. `imageproc` only knows a default
//! pixel for exposed regions, so [`FillPolicy::Clamp`] samples the inverse map
//! here with edge replication.

use super::calculations::{RotationMap, centre, rotated_bounds, warp_source};
use super::params::{
    BoxBlur, Brightness, Contrast, FillPolicy, Fireflies, GaussianBlur, Interpolation,
    RotateOptions, Rotation, Translation, Warp,
};
use image::{ColorType, DynamicImage, ImageBuffer, Pixel, Primitive};
use imageproc::geometric_transformations::{self as geometric, Projection};
use num_traits::NumCast;
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },
    #[error("Unsupported pixel format: {0:?}")]
    UnsupportedFormat(ColorType),
}

impl TransformError {
    pub(crate) fn invalid(name: &'static str, value: f32, reason: &'static str) -> Self {
        TransformError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Result type for transforms.
pub type Result<T> = std::result::Result<T, TransformError>;

type Buffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Apply `$body` to the typed buffer behind a supported [`DynamicImage`],
/// rewrapping the result in the same variant.
macro_rules! per_layout {
    ($img:expr, $buf:ident => $body:expr) => {
        match $img {
            DynamicImage::ImageLuma8($buf) => Ok(DynamicImage::ImageLuma8($body)),
            DynamicImage::ImageLumaA8($buf) => Ok(DynamicImage::ImageLumaA8($body)),
            DynamicImage::ImageRgb8($buf) => Ok(DynamicImage::ImageRgb8($body)),
            DynamicImage::ImageRgba8($buf) => Ok(DynamicImage::ImageRgba8($body)),
            DynamicImage::ImageLuma16($buf) => Ok(DynamicImage::ImageLuma16($body)),
            DynamicImage::ImageLumaA16($buf) => Ok(DynamicImage::ImageLumaA16($body)),
            DynamicImage::ImageRgb16($buf) => Ok(DynamicImage::ImageRgb16($body)),
            DynamicImage::ImageRgba16($buf) => Ok(DynamicImage::ImageRgba16($body)),
            other => Err(TransformError::UnsupportedFormat(other.color())),
        }
    };
}

/// Check that the transforms can handle this image's layout.
pub fn ensure_supported(img: &DynamicImage) -> Result<()> {
    match img.color() {
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16 => Ok(()),
        other => Err(TransformError::UnsupportedFormat(other)),
    }
}

// ============================================================================
// Geometric
// ============================================================================

/// Shift image content by `(dx, dy)` pixels.
pub fn translate(
    img: &DynamicImage,
    params: Translation,
    interpolation: Interpolation,
    fill: FillPolicy,
) -> Result<DynamicImage> {
    params.validate()?;
    fill.validate()?;
    ensure_supported(img)?;
    if is_empty(img) || (params.dx == 0.0 && params.dy == 0.0) {
        return Ok(img.clone());
    }
    let projection = Projection::translate(params.dx, params.dy);
    let (dx, dy) = (params.dx as f64, params.dy as f64);
    per_layout!(img, buf => match fill {
        FillPolicy::Constant(level) => {
            geometric::warp(buf, &projection, interpolation.into(), fill_pixel(buf, level))
        }
        FillPolicy::Clamp => {
            clamped_remap(buf, buf.dimensions(), interpolation, |x, y| {
                (x as f64 - dx, y as f64 - dy)
            })
        }
    })
}

/// Rotate counter-clockwise about the image centre.
pub fn rotate(img: &DynamicImage, params: Rotation, options: RotateOptions) -> Result<DynamicImage> {
    params.validate()?;
    options.fill.validate()?;
    ensure_supported(img)?;
    if is_empty(img) || params.degrees % 360.0 == 0.0 {
        return Ok(img.clone());
    }
    let src = (img.width(), img.height());
    let dst = if options.expand {
        rotated_bounds(src.0, src.1, params.degrees)
    } else {
        src
    };
    let map = RotationMap::new(src, dst, params.degrees);
    let projection = rotation_projection(src, dst, params.degrees);
    per_layout!(img, buf => match options.fill {
        FillPolicy::Constant(level) => {
            let mut out = ImageBuffer::new(dst.0, dst.1);
            geometric::warp_into(
                buf,
                &projection,
                options.interpolation.into(),
                fill_pixel(buf, level),
                &mut out,
            );
            out
        }
        FillPolicy::Clamp => {
            clamped_remap(buf, dst, options.interpolation, |x, y| map.source_of(x, y))
        }
    })
}

fn is_empty(img: &DynamicImage) -> bool {
    img.width() == 0 || img.height() == 0
}

/// Forward projection taking source pixels onto a `dst` canvas, rotated
/// counter-clockwise as displayed with both centres aligned.
fn rotation_projection(src: (u32, u32), dst: (u32, u32), degrees: f32) -> Projection {
    let (scx, scy) = centre(src.0, src.1);
    let (dcx, dcy) = centre(dst.0, dst.1);
    // imageproc rotates clockwise with y pointing down
    Projection::translate(-scx as f32, -scy as f32)
        .and_then(Projection::rotate(-degrees.to_radians()))
        .and_then(Projection::translate(dcx as f32, dcy as f32))
}

impl From<Interpolation> for geometric::Interpolation {
    fn from(interpolation: Interpolation) -> Self {
        match interpolation {
            Interpolation::Nearest => geometric::Interpolation::Nearest,
            Interpolation::Bilinear => geometric::Interpolation::Bilinear,
        }
    }
}

/// Sinusoidal displacement of pixel coordinates in both axes.
pub fn warp(img: &DynamicImage, params: Warp) -> Result<DynamicImage> {
    params.validate()?;
    per_layout!(img, buf => warp_buffer(buf, params))
}

fn warp_buffer<P: Pixel + 'static>(src: &Buffer<P>, params: Warp) -> Buffer<P> {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return src.clone();
    }
    ImageBuffer::from_fn(w, h, |x, y| {
        let (sx, sy) = warp_source(x, y, w, h, params.amplitude, params.frequency);
        *src.get_pixel(sx, sy)
    })
}

/// Horizontal flip. Applying it twice returns the original.
pub fn mirror(img: &DynamicImage) -> Result<DynamicImage> {
    ensure_supported(img)?;
    Ok(img.fliph())
}

/// Vertical flip.
pub fn flip(img: &DynamicImage) -> Result<DynamicImage> {
    ensure_supported(img)?;
    Ok(img.flipv())
}

// ============================================================================
// Filters
// ============================================================================

/// Gaussian blur. A sigma of zero returns the image unchanged.
pub fn gaussian_blur(img: &DynamicImage, params: GaussianBlur) -> Result<DynamicImage> {
    params.validate()?;
    ensure_supported(img)?;
    // imageops::blur treats sigma <= 0 as 1.0
    if params.sigma == 0.0 {
        return Ok(img.clone());
    }
    per_layout!(img, buf => image::imageops::blur(buf, params.sigma))
}

/// Mean filter over a square window, edges clamped.
pub fn box_blur(img: &DynamicImage, params: BoxBlur) -> Result<DynamicImage> {
    params.validate()?;
    let radius = params.window();
    per_layout!(img, buf => box_blur_buffer(buf, radius))
}

fn box_blur_buffer<P: Pixel + 'static>(src: &Buffer<P>, radius: u32) -> Buffer<P> {
    let (w, h) = src.dimensions();
    if radius == 0 || w == 0 || h == 0 {
        return src.clone();
    }
    let channels = P::CHANNEL_COUNT as usize;
    let samples: Vec<f64> = src.as_raw().iter().map(|s| to_f32(*s) as f64).collect();
    let (w, h, r) = (w as usize, h as usize, radius as u64);
    let horizontal = mean_pass(&samples, (w, h), channels, r, true);
    let both = mean_pass(&horizontal, (w, h), channels, r, false);
    let raw: Vec<P::Subpixel> = both.into_iter().map(|v| from_f32(v as f32)).collect();
    // Same length as the source buffer, so construction cannot fail
    ImageBuffer::from_raw(w as u32, h as u32, raw).unwrap_or_else(|| src.clone())
}

/// One axis of a separable mean filter over interleaved samples.
///
/// Sliding window sum: each output costs two samples whatever the radius.
/// Positions past either end read the edge sample.
fn mean_pass(
    data: &[f64],
    (width, height): (usize, usize),
    channels: usize,
    radius: u64,
    horizontal: bool,
) -> Vec<f64> {
    let (lines, len, step) = if horizontal {
        (height, width, channels)
    } else {
        (width, height, width * channels)
    };
    let line_start = |line: usize| {
        if horizontal {
            line * width * channels
        } else {
            line * channels
        }
    };
    let last = len - 1;
    let taps = 2.0 * radius as f64 + 1.0;
    let inner = radius.min(last as u64) as usize;

    let mut out = vec![0.0f64; data.len()];
    for line in 0..lines {
        for c in 0..channels {
            let base = line_start(line) + c;
            let at = |i: usize| data[base + i * step];
            // Window centred on 0: r + 1 copies of the first sample, the next
            // `inner` samples, then the last sample for whatever remains
            let mut sum = (radius as f64 + 1.0) * at(0)
                + (1..=inner).map(&at).sum::<f64>()
                + (radius - inner as u64) as f64 * at(last);
            for i in 0..len {
                out[base + i * step] = sum / taps;
                let enter = (i as u64 + radius + 1).min(last as u64) as usize;
                let leave = (i as u64).saturating_sub(radius) as usize;
                sum += at(enter) - at(leave);
            }
        }
    }
    out
}

// ============================================================================
// Photometric
// ============================================================================

/// Add `delta × full scale` to every colour sample, clamped. Alpha untouched.
pub fn brightness(img: &DynamicImage, params: Brightness) -> Result<DynamicImage> {
    params.validate()?;
    per_layout!(img, buf => {
        let offset = params.delta * full_scale(buf);
        map_colour(buf, |c| c + offset)
    })
}

/// Scale colour samples around mid-grey by `factor`, clamped. Alpha untouched.
pub fn contrast(img: &DynamicImage, params: Contrast) -> Result<DynamicImage> {
    params.validate()?;
    per_layout!(img, buf => {
        let mid = mid_grey(buf);
        map_colour(buf, |c| mid + params.factor * (c - mid))
    })
}

/// Replace random pixels with a flat grey.
pub fn fireflies(
    img: &DynamicImage,
    params: Fireflies,
    rng: &mut impl Rng,
) -> Result<DynamicImage> {
    params.validate()?;
    per_layout!(img, buf => fireflies_buffer(buf, params, rng))
}

fn fireflies_buffer<P: Pixel + 'static>(
    src: &Buffer<P>,
    params: Fireflies,
    rng: &mut impl Rng,
) -> Buffer<P> {
    let mut out = src.clone();
    let max = scale_of::<P::Subpixel>();
    let grey: P::Subpixel = from_f32(params.level * max);
    let fraction = params.fraction as f64;
    for px in out.pixels_mut() {
        if rng.random_bool(fraction) {
            px.apply_without_alpha(|_| grey);
        }
    }
    out
}

// ============================================================================
// Sample helpers
// ============================================================================

fn to_f32<S: Primitive>(s: S) -> f32 {
    <f32 as NumCast>::from(s).unwrap_or(0.0)
}

fn from_f32<S: Primitive>(v: f32) -> S {
    let clamped = v.round().clamp(0.0, scale_of::<S>());
    <S as NumCast>::from(clamped).unwrap_or(S::DEFAULT_MIN_VALUE)
}

/// Full-scale sample value (255 for 8-bit, 65535 for 16-bit).
fn scale_of<S: Primitive>() -> f32 {
    to_f32(S::DEFAULT_MAX_VALUE)
}

/// Full scale of a buffer's sample type.
fn full_scale<P: Pixel>(_: &Buffer<P>) -> f32 {
    scale_of::<P::Subpixel>()
}

/// Contrast pivot: 128 for 8-bit, 32768 for 16-bit.
fn mid_grey<P: Pixel>(_: &Buffer<P>) -> f32 {
    (scale_of::<P::Subpixel>() + 1.0) / 2.0
}

fn map_colour<P: Pixel + 'static>(src: &Buffer<P>, f: impl Fn(f32) -> f32) -> Buffer<P> {
    let mut out = src.clone();
    for px in out.pixels_mut() {
        px.apply_without_alpha(|s| from_f32(f(to_f32(s))));
    }
    out
}

/// Fill pixel for constant fill: every colour channel at `level` × full
/// scale, alpha opaque.
fn fill_pixel<P: Pixel>(_: &Buffer<P>, level: f32) -> P {
    let value: P::Subpixel = from_f32(level * scale_of::<P::Subpixel>());
    let samples = vec![value; P::CHANNEL_COUNT as usize];
    let mut px = *P::from_slice(&samples);
    px.apply_with_alpha(|c| c, |_| P::Subpixel::DEFAULT_MAX_VALUE);
    px
}

/// Source pixel at `(x, y)`, clamped to the nearest edge.
fn edge_pixel<P: Pixel>(src: &Buffer<P>, x: i64, y: i64) -> P {
    let (w, h) = (src.width() as i64, src.height() as i64);
    *src.get_pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32)
}

/// Build a `dst`-sized image by sampling `src` where `map` says each output
/// pixel comes from, replicating edge pixels beyond the source.
fn clamped_remap<P, F>(
    src: &Buffer<P>,
    dst: (u32, u32),
    interpolation: Interpolation,
    map: F,
) -> Buffer<P>
where
    P: Pixel + 'static,
    F: Fn(u32, u32) -> (f64, f64),
{
    if src.width() == 0 || src.height() == 0 {
        return ImageBuffer::new(dst.0, dst.1);
    }
    ImageBuffer::from_fn(dst.0, dst.1, |x, y| {
        let (sx, sy) = map(x, y);
        match interpolation {
            Interpolation::Nearest => edge_pixel(src, sx.round() as i64, sy.round() as i64),
            Interpolation::Bilinear => bilinear(src, sx, sy),
        }
    })
}

fn bilinear<P: Pixel>(src: &Buffer<P>, sx: f64, sy: f64) -> P {
    let (x0, y0) = (sx.floor(), sy.floor());
    let (fx, fy) = ((sx - x0) as f32, (sy - y0) as f32);
    // Float-to-int casts saturate, so the neighbours must too
    let (x0, y0) = (x0 as i64, y0 as i64);
    let (x1, y1) = (x0.saturating_add(1), y0.saturating_add(1));

    let p00 = edge_pixel(src, x0, y0);
    if fx == 0.0 && fy == 0.0 {
        return p00;
    }
    let p01 = edge_pixel(src, x1, y0);
    let p10 = edge_pixel(src, x0, y1);
    let p11 = edge_pixel(src, x1, y1);

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w01 = fx * (1.0 - fy);
    let w10 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut out = p00;
    let (c00, c01, c10, c11) = (p00.channels(), p01.channels(), p10.channels(), p11.channels());
    for (k, sample) in out.channels_mut().iter_mut().enumerate() {
        let v = to_f32(c00[k]) * w00
            + to_f32(c01[k]) * w01
            + to_f32(c10[k]) * w10
            + to_f32(c11[k]) * w11;
        *sample = from_f32(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn all_layouts() -> Vec<DynamicImage> {
        let rgb = gradient(9, 6);
        vec![
            DynamicImage::ImageLuma8(rgb.to_luma8()),
            DynamicImage::ImageLumaA8(rgb.to_luma_alpha8()),
            rgb.clone(),
            DynamicImage::ImageRgba8(rgb.to_rgba8()),
            DynamicImage::ImageLuma16(rgb.to_luma16()),
            DynamicImage::ImageRgb16(rgb.to_rgb16()),
            DynamicImage::ImageRgba16(rgb.to_rgba16()),
        ]
    }

    fn fill() -> FillPolicy {
        FillPolicy::Constant(0.0)
    }

    #[test]
    fn every_transform_preserves_size_and_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        for img in all_layouts() {
            let outputs = vec![
                translate(&img, Translation { dx: 1.5, dy: -2.0 }, Interpolation::Bilinear, fill())
                    .unwrap(),
                rotate(&img, Rotation { degrees: 3.0 }, RotateOptions::default()).unwrap(),
                warp(&img, Warp { amplitude: 1.0, frequency: 2.0 }).unwrap(),
                gaussian_blur(&img, GaussianBlur { sigma: 0.4 }).unwrap(),
                box_blur(&img, BoxBlur { radius: 1.0 }).unwrap(),
                brightness(&img, Brightness { delta: 0.1 }).unwrap(),
                contrast(&img, Contrast { factor: 1.2 }).unwrap(),
                fireflies(&img, Fireflies { fraction: 0.2, level: 0.5 }, &mut rng).unwrap(),
                mirror(&img).unwrap(),
                flip(&img).unwrap(),
            ];
            for out in outputs {
                assert_eq!(out.dimensions(), img.dimensions());
                assert_eq!(out.color(), img.color());
            }
        }
    }

    #[test]
    fn float_layouts_are_unsupported() {
        let img = DynamicImage::ImageRgb32F(gradient(4, 4).to_rgb32f());
        let err = brightness(&img, Brightness { delta: 0.1 }).unwrap_err();
        assert_eq!(err, TransformError::UnsupportedFormat(ColorType::Rgb32F));
        assert!(mirror(&img).is_err());
        assert!(gaussian_blur(&img, GaussianBlur { sigma: 1.0 }).is_err());
    }

    #[test]
    fn invalid_parameter_checked_before_layout() {
        let img = DynamicImage::ImageRgb32F(gradient(4, 4).to_rgb32f());
        let err = gaussian_blur(&img, GaussianBlur { sigma: -1.0 }).unwrap_err();
        assert!(matches!(err, TransformError::InvalidParameter { .. }));
    }

    #[test]
    fn zero_translation_is_identity() {
        let img = gradient(12, 8);
        for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
            let out = translate(&img, Translation { dx: 0.0, dy: 0.0 }, interpolation, fill())
                .unwrap();
            assert_eq!(out, img);
        }
    }

    #[test]
    fn zero_rotation_is_identity() {
        let img = gradient(12, 8);
        for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
            let options = RotateOptions {
                interpolation,
                ..RotateOptions::default()
            };
            let out = rotate(&img, Rotation { degrees: 0.0 }, options).unwrap();
            assert_eq!(out, img);
        }
    }

    #[test]
    fn integer_translation_moves_content_and_fills() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(4, 4, |x, y| {
            Luma([(10 * (y * 4 + x) + 5) as u8])
        }));
        let out = translate(
            &img,
            Translation { dx: 1.0, dy: 2.0 },
            Interpolation::Nearest,
            FillPolicy::Constant(0.0),
        )
        .unwrap()
        .to_luma8();

        assert_eq!(out.get_pixel(1, 2), img.to_luma8().get_pixel(0, 0));
        assert_eq!(out.get_pixel(3, 3), img.to_luma8().get_pixel(2, 1));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(3, 1)[0], 0);
    }

    #[test]
    fn clamp_fill_replicates_edges() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(3, 1, |x, _| Luma([x as u8 * 50])));
        let out = translate(
            &img,
            Translation { dx: 2.0, dy: 0.0 },
            Interpolation::Nearest,
            FillPolicy::Clamp,
        )
        .unwrap()
        .to_luma8();
        assert_eq!(out.as_raw(), &vec![0, 0, 0]);
    }

    #[test]
    fn constant_fill_keeps_alpha_opaque() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 40])));
        let out = translate(
            &img,
            Translation { dx: 4.0, dy: 0.0 },
            Interpolation::Nearest,
            FillPolicy::Constant(1.0),
        )
        .unwrap()
        .to_rgba8();
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn expanded_rotation_grows_canvas() {
        let img = gradient(20, 10);
        let options = RotateOptions {
            expand: true,
            ..RotateOptions::default()
        };
        let out = rotate(&img, Rotation { degrees: 90.0 }, options).unwrap();
        assert_eq!((out.width(), out.height()), (10, 20));
        assert_eq!(out.color(), img.color());
    }

    #[test]
    fn expanded_rotation_with_clamp_fill_grows_canvas() {
        let img = gradient(20, 10);
        let options = RotateOptions {
            expand: true,
            fill: FillPolicy::Clamp,
            ..RotateOptions::default()
        };
        let out = rotate(&img, Rotation { degrees: 30.0 }, options).unwrap();
        assert_eq!(
            (out.width(), out.height()),
            rotated_bounds(20, 10, 30.0)
        );
    }

    #[test]
    fn half_turn_equals_double_flip() {
        let img = gradient(7, 5);
        let options = RotateOptions {
            interpolation: Interpolation::Nearest,
            fill: FillPolicy::Clamp,
            ..RotateOptions::default()
        };
        let out = rotate(&img, Rotation { degrees: 180.0 }, options).unwrap();
        assert_eq!(out, img.fliph().flipv());
    }

    #[test]
    fn rotation_keeps_centre_pixel() {
        let img = gradient(7, 5);
        for fill in [FillPolicy::Constant(0.0), FillPolicy::Clamp] {
            let options = RotateOptions {
                interpolation: Interpolation::Nearest,
                fill,
                ..RotateOptions::default()
            };
            let out = rotate(&img, Rotation { degrees: 90.0 }, options).unwrap();
            assert_eq!(out.get_pixel(3, 2), img.get_pixel(3, 2));
        }
    }

    #[test]
    fn huge_translation_is_all_fill() {
        let img = gradient(4, 4);
        let shift = Translation { dx: -1.0e19, dy: 0.5 };
        let out = translate(&img, shift, Interpolation::Bilinear, FillPolicy::Constant(0.0))
            .unwrap()
            .to_rgb8();
        assert!(out.pixels().all(|p| *p == Rgb([0, 0, 0])));

        let clamped = translate(&img, shift, Interpolation::Bilinear, FillPolicy::Clamp).unwrap();
        assert_eq!(clamped.dimensions(), (4, 4));
    }

    #[test]
    fn mirror_twice_is_identity() {
        for img in all_layouts() {
            let twice = mirror(&mirror(&img).unwrap()).unwrap();
            assert_eq!(twice, img);
        }
    }

    #[test]
    fn brightness_clamps_at_both_ends() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(2, 1, |x, _| {
            Luma([if x == 0 { 10 } else { 250 }])
        }));
        let up = brightness(&img, Brightness { delta: 0.5 }).unwrap().to_luma8();
        assert_eq!(up.as_raw(), &vec![138, 255]);
        let down = brightness(&img, Brightness { delta: -0.5 }).unwrap().to_luma8();
        assert_eq!(down.as_raw(), &vec![0, 123]);
    }

    #[test]
    fn brightness_scales_with_depth() {
        let img = DynamicImage::ImageLuma16(image::ImageBuffer::from_pixel(1, 1, Luma([0u16])));
        let out = brightness(&img, Brightness { delta: 1.0 }).unwrap().to_luma16();
        assert_eq!(out.get_pixel(0, 0)[0], u16::MAX);
    }

    #[test]
    fn brightness_leaves_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 77])));
        let out = brightness(&img, Brightness { delta: 0.2 }).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(0, 0)[3], 77);
        assert_eq!(out.get_pixel(0, 0)[0], 151);
    }

    #[test]
    fn contrast_pivots_on_mid_grey_and_clamps() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(3, 1, |x, _| {
            Luma([[128u8, 28, 250][x as usize]])
        }));
        let out = contrast(&img, Contrast { factor: 2.0 }).unwrap().to_luma8();
        assert_eq!(out.as_raw(), &vec![128, 0, 255]);

        let flat = contrast(&img, Contrast { factor: 0.0 }).unwrap().to_luma8();
        assert_eq!(flat.as_raw(), &vec![128, 128, 128]);
    }

    #[test]
    fn contrast_identity_factor() {
        let img = gradient(5, 5);
        assert_eq!(contrast(&img, Contrast { factor: 1.0 }).unwrap(), img);
    }

    #[test]
    fn warp_zero_amplitude_is_identity() {
        let img = gradient(10, 10);
        let out = warp(&img, Warp { amplitude: 0.0, frequency: 4.0 }).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn zero_sigma_blur_is_identity() {
        let img = gradient(6, 6);
        assert_eq!(gaussian_blur(&img, GaussianBlur { sigma: 0.0 }).unwrap(), img);
    }

    #[test]
    fn box_blur_flat_image_unchanged() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 4, Rgb([40, 80, 120])));
        assert_eq!(box_blur(&img, BoxBlur { radius: 2.0 }).unwrap(), img);
    }

    #[test]
    fn box_blur_averages_neighbours() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(3, 1, |x, _| {
            Luma([if x == 1 { 90 } else { 0 }])
        }));
        let out = box_blur(&img, BoxBlur { radius: 1.0 }).unwrap().to_luma8();
        assert_eq!(out.as_raw(), &vec![30, 30, 30]);
    }

    #[test]
    fn box_blur_radius_beyond_image_stays_fast() {
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 4, Rgb([40, 80, 120])));
        assert_eq!(box_blur(&flat, BoxBlur { radius: f32::MAX }).unwrap(), flat);

        // The window is almost entirely edge copies, which are black here
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(3, 1, |x, _| {
            Luma([if x == 1 { 90 } else { 0 }])
        }));
        let out = box_blur(&img, BoxBlur { radius: 1.0e6 }).unwrap().to_luma8();
        assert_eq!(out.as_raw(), &vec![0, 0, 0]);
    }

    #[test]
    fn box_blur_radius_two_matches_direct_mean() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(5, 1, |x, _| Luma([x as u8 * 10])));
        let out = box_blur(&img, BoxBlur { radius: 2.0 }).unwrap().to_luma8();
        // Row [0, 10, 20, 30, 40], window of 5 with edge copies, then a
        // vertical pass over a single row that leaves it unchanged
        assert_eq!(out.as_raw(), &vec![6, 12, 20, 28, 34]);
    }

    #[test]
    fn fireflies_full_fraction_paints_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let img = gradient(4, 4);
        let out = fireflies(&img, Fireflies { fraction: 1.0, level: 0.0 }, &mut rng)
            .unwrap()
            .to_rgb8();
        assert!(out.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn fireflies_zero_fraction_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let img = gradient(4, 4);
        let out = fireflies(&img, Fireflies { fraction: 0.0, level: 1.0 }, &mut rng).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn empty_image_passes_through() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let out = rotate(&img, Rotation { degrees: 30.0 }, RotateOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
        assert_eq!(warp(&img, Warp { amplitude: 1.0, frequency: 1.0 }).unwrap(), img);
    }
}
