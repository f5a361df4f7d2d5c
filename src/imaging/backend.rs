//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from storage: probe, load and save. Everything between load and save is
//! pure pixel work in [`operations`](super::operations).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in the recording `MockBackend` below so the orchestrator
//! can be exercised without encoding files.

use super::params::Quality;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Cannot read {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("Cannot write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl BackendError {
    pub fn read(path: &Path, reason: impl ToString) -> Self {
        BackendError::Read {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: &Path, reason: impl ToString) -> Self {
        BackendError::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Result of a probe operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image storage backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Read just enough of the file to learn its dimensions.
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode a whole image.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode an image to `path`, creating parent directories.
    fn save(&self, image: &DynamicImage, path: &Path, quality: Quality)
    -> Result<(), BackendError>;
}
