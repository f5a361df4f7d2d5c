//! Input discovery.
//!
//! Stage 1 of the augmentation pipeline. Lists the images in the input
//! directory and probes each one's header so undecodable files are reported
//! before any work is scheduled.
//!
//! ## Directory Structure
//!
//! ```text
//! Train/                  # Input root
//! ├── cat.png             # Image: augmented
//! ├── dog.JPG             # Extensions match case-insensitively
//! ├── notes.txt           # Skipped with a warning
//! └── birds/              # Only descended with scan.recursive = true
//!     └── owl.jpg         #   → Export/birds/owl_0.jpg, ...
//! ```
//!
//! ## Output
//!
//! A [`Manifest`] with the images to process (sorted by path) and every
//! skipped regular file with its reason. Skips are never fatal; only an
//! unreadable input root is.

use crate::config::ScanConfig;
use crate::imaging::{ImageBackend, RustBackend};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read input directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Result of the scan stage.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub root: PathBuf,
    pub images: Vec<SourceImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
}

/// An input image that passed the header probe.
#[derive(Debug, Clone, Serialize)]
pub struct SourceImage {
    /// Path on disk.
    pub path: PathBuf,
    /// Path relative to the input root, used for output naming and seeding.
    pub relative: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// A regular file the scanner passed over.
#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Extension not in `scan.extensions`.
    NotAnImage,
    /// Header could not be read or decoded.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnImage => write!(f, "not an image"),
            SkipReason::Unreadable(reason) => write!(f, "unreadable: {reason}"),
        }
    }
}

/// Scan `root` with the production backend.
///
/// `exclude` is a directory never descended into (the output directory when
/// it lives inside the input).
pub fn scan(
    root: &Path,
    config: &ScanConfig,
    exclude: Option<&Path>,
) -> Result<Manifest, ScanError> {
    scan_with_backend(root, config, exclude, &RustBackend::new())
}

pub fn scan_with_backend(
    root: &Path,
    config: &ScanConfig,
    exclude: Option<&Path>,
    backend: &impl ImageBackend,
) -> Result<Manifest, ScanError> {
    let unreadable = |source| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    };
    let meta = fs::metadata(root).map_err(unreadable)?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    // Surface permission problems on the root itself as fatal
    fs::read_dir(root).map_err(unreadable)?;

    let excluded = exclude.and_then(|p| p.canonicalize().ok());
    let max_depth = if config.recursive { usize::MAX } else { 1 };

    let mut images = Vec::new();
    let mut skipped = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && excluded
                    .as_deref()
                    .is_some_and(|ex| entry.path().canonicalize().is_ok_and(|p| p == ex)))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.into());
                log::warn!("Skipping {}: {}", path.display(), e);
                skipped.push(Skipped {
                    path,
                    reason: SkipReason::Unreadable(e.to_string()),
                });
                continue;
            }
        };
        let path = entry.path();
        // Follow symlinks when deciding what counts as a regular file
        if !fs::metadata(path).is_ok_and(|m| m.is_file()) {
            continue;
        }

        if !config.accepts(path) {
            log::warn!("Skipping {}: not an image", path.display());
            skipped.push(Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::NotAnImage,
            });
            continue;
        }

        match backend.probe(path) {
            Ok(dims) => {
                let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                log::debug!(
                    "Found {} ({}x{})",
                    relative.display(),
                    dims.width,
                    dims.height
                );
                images.push(SourceImage {
                    path: path.to_path_buf(),
                    relative,
                    width: dims.width,
                    height: dims.height,
                });
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                skipped.push(Skipped {
                    path: path.to_path_buf(),
                    reason: SkipReason::Unreadable(e.to_string()),
                });
            }
        }
    }

    Ok(Manifest {
        root: root.to_path_buf(),
        images,
        skipped,
    })
}
