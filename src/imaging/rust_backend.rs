//! Pure Rust image I/O backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode others | `DynamicImage::save_with_format` (lossless) |
//!
//! The output format follows the output file's extension. Layouts an encoder
//! cannot hold are converted first: JPEG drops alpha and goes to 8-bit, WebP
//! and BMP go to 8-bit, TIFF gains colour channels for grey + alpha.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose codecs are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that can be both read and written.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert `img` into a layout `format` can encode, borrowing when no
/// conversion is needed.
fn fit_to_format(img: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    let color = img.color();
    match format {
        ImageFormat::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(img),
            ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                Cow::Owned(DynamicImage::ImageLuma8(img.to_luma8()))
            }
            _ => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        },
        ImageFormat::WebP | ImageFormat::Bmp => match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                Cow::Borrowed(img)
            }
            ColorType::L16 => Cow::Owned(DynamicImage::ImageLuma8(img.to_luma8())),
            ColorType::La16 => Cow::Owned(DynamicImage::ImageLumaA8(img.to_luma_alpha8())),
            ColorType::Rgb16 => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
            _ => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
        },
        ImageFormat::Tiff => match color {
            ColorType::La8 => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
            ColorType::La16 => Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16())),
            _ => Cow::Borrowed(img),
        },
        _ => Cow::Borrowed(img),
    }
}

/// Encode `img` to `path` in the format named by the extension.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| BackendError::write(path, e))?;
    if !format.writing_enabled() {
        return Err(BackendError::write(
            path,
            format!("no encoder for {format:?}"),
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BackendError::write(path, e))?;
    }

    let fitted = fit_to_format(img, format);
    match format {
        ImageFormat::Jpeg => {
            let file = fs::File::create(path).map_err(|e| BackendError::write(path, e))?;
            let encoder =
                JpegEncoder::new_with_quality(BufWriter::new(file), quality.value() as u8);
            fitted.write_with_encoder(encoder)
        }
        other => fitted.save_with_format(path, other),
    }
    .map_err(|e| BackendError::write(path, e))
}

impl ImageBackend for RustBackend {
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| BackendError::read(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)
            .map_err(|e| BackendError::read(path, e))?
            .with_guessed_format()
            .map_err(|e| BackendError::read(path, e))?
            .decode()
            .map_err(|e| BackendError::read(path, e))
    }

    fn save(
        &self,
        image: &DynamicImage,
        path: &Path,
        quality: Quality,
    ) -> Result<(), BackendError> {
        save_image(image, path, quality)
    }
}
