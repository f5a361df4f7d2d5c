//! Orchestration: load → generate → write, for every scanned image.
//!
//! Stage 3 of the augmentation pipeline. Takes the [`Manifest`] from the scan
//! stage and, for each source image, generates its variants and writes them
//! under the output directory.
//!
//! ## Output Structure
//!
//! ```text
//! Export/
//! ├── cat_0.png
//! ├── cat_0_mirrored.png
//! ├── ...
//! ├── cat_4.png
//! ├── cat_4_mirrored.png
//! └── birds/              # recursive scans keep sub-directories
//!     └── owl_0.jpg
//! ```
//!
//! ## Failure policy
//!
//! Nothing here aborts the run. A source that cannot be read, a variant whose
//! transforms fail and an output that cannot be written are each recorded in
//! the [`RunReport`] and logged; everything else carries on.
//!
//! ## Parallel Processing
//!
//! Source images are processed in parallel using [rayon](https://docs.rs/rayon).
//! Every file draws from its own RNG, seeded from the run seed and the file's
//! relative path, so the output does not depend on thread count or scheduling.

use crate::config::AugmentConfig;
use crate::imaging::{BackendError, ImageBackend, Quality, RustBackend, TransformError};
use crate::naming::{OutputKind, output_path};
use crate::scan::{Manifest, Skipped, SourceImage};
use crate::variants::{GeneratorConfig, generate_variants};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub generator: GeneratorConfig,
    pub seed: u64,
    pub quality: Quality,
}

impl ProcessConfig {
    /// Build from a loaded config; `seed` is the resolved run seed.
    pub fn from_config(config: &AugmentConfig, seed: u64) -> Self {
        Self {
            generator: GeneratorConfig::from_config(config),
            seed,
            quality: Quality::new(config.output.quality),
        }
    }
}

/// The configured seed, or a fresh one from the thread RNG.
pub fn run_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(|| rand::rng().random())
}

/// Seed for one file's RNG: the first 8 bytes of
/// `SHA-256(run seed ‖ relative path)`.
///
/// Path separators are normalised to `/` so a seed reproduces across
/// platforms.
pub fn file_seed(run_seed: u64, relative: &Path) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(run_seed.to_le_bytes());
    hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

/// Progress events sent while processing, one per source image.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// The source was processed; `outputs` lists every file it produced or
    /// tried to produce.
    ImageProcessed {
        index: usize,
        source_path: String,
        outputs: Vec<OutputInfo>,
    },
    /// The source could not be read.
    ImageFailed {
        index: usize,
        source_path: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputInfo {
    /// Output file name.
    pub label: String,
    pub status: OutputStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputStatus {
    Written,
    TransformFailed(String),
    WriteFailed(String),
}

/// Category of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Read,
    Write,
    InvalidParameter,
    UnsupportedFormat,
}

impl From<&TransformError> for FailureKind {
    fn from(e: &TransformError) -> Self {
        match e {
            TransformError::InvalidParameter { .. } => FailureKind::InvalidParameter,
            TransformError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
        }
    }
}

impl From<&BackendError> for FailureKind {
    fn from(e: &BackendError) -> Self {
        match e {
            BackendError::Read { .. } => FailureKind::Read,
            BackendError::Write { .. } => FailureKind::Write,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    /// Source image, relative to the input root.
    pub source: PathBuf,
    /// Variant index, when the failure belongs to one variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<usize>,
    /// Output file, when the failure happened while writing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub kind: FailureKind,
    pub message: String,
}

/// Everything that happened during a run. Serialised for `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    /// Source images attempted.
    pub sources: usize,
    /// Sources that could not be read.
    pub sources_failed: usize,
    /// Variants generated without transform errors.
    pub variants_generated: usize,
    /// Variants whose transforms failed.
    pub variants_failed: usize,
    /// Image files written, mirrored copies included.
    pub files_written: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
    pub failures: Vec<Failure>,
}

impl RunReport {
    /// True when nothing failed. Skipped files do not count.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-file result, merged into the report after the parallel section.
#[derive(Default)]
struct FileOutcome {
    read_failed: bool,
    variants_generated: usize,
    variants_failed: usize,
    files_written: usize,
    failures: Vec<Failure>,
}

/// Process every image in `manifest` with the production backend.
pub fn process(
    manifest: &Manifest,
    output_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, ProcessError> {
    process_with_backend(&RustBackend::new(), manifest, output_dir, config, progress)
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    manifest: &Manifest,
    output_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, ProcessError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ProcessError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    log::info!(
        "Processing {} images with seed {}",
        manifest.images.len(),
        config.seed
    );

    let outcomes: Vec<FileOutcome> = manifest
        .images
        .par_iter()
        .enumerate()
        .map(|(i, source)| {
            let (outcome, event) = process_image(backend, i + 1, source, output_dir, config);
            if let Some(tx) = &progress {
                // Receiver gone means nobody is printing; keep working
                tx.send(event).ok();
            }
            outcome
        })
        .collect();

    let mut report = RunReport {
        seed: config.seed,
        sources: manifest.images.len(),
        sources_failed: 0,
        variants_generated: 0,
        variants_failed: 0,
        files_written: 0,
        skipped: manifest.skipped.clone(),
        failures: Vec::new(),
    };
    for outcome in outcomes {
        report.sources_failed += usize::from(outcome.read_failed);
        report.variants_generated += outcome.variants_generated;
        report.variants_failed += outcome.variants_failed;
        report.files_written += outcome.files_written;
        report.failures.extend(outcome.failures);
    }
    Ok(report)
}

fn process_image(
    backend: &impl ImageBackend,
    index: usize,
    source: &SourceImage,
    output_dir: &Path,
    config: &ProcessConfig,
) -> (FileOutcome, ProcessEvent) {
    let source_path = source.relative.to_string_lossy().into_owned();
    let mut outcome = FileOutcome::default();

    let img = match backend.load(&source.path) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("{e}");
            outcome.read_failed = true;
            outcome.failures.push(Failure {
                source: source.relative.clone(),
                variant: None,
                output: None,
                kind: FailureKind::from(&e),
                message: e.to_string(),
            });
            let event = ProcessEvent::ImageFailed {
                index,
                source_path,
                error: e.to_string(),
            };
            return (outcome, event);
        }
    };

    let mut rng = StdRng::seed_from_u64(file_seed(config.seed, &source.relative));
    let set = generate_variants(&img, &config.generator, &mut rng);
    let mut outputs = Vec::new();

    let save = |image: &image::DynamicImage,
                kind: OutputKind,
                variant: Option<usize>,
                outcome: &mut FileOutcome|
     -> OutputInfo {
        let path = output_path(output_dir, &source.relative, kind);
        let label = file_label(&path);
        let status = match backend.save(image, &path, config.quality) {
            Ok(()) => {
                log::debug!("Wrote {}", path.display());
                outcome.files_written += 1;
                OutputStatus::Written
            }
            Err(e) => {
                log::warn!("{e}");
                outcome.failures.push(Failure {
                    source: source.relative.clone(),
                    variant,
                    output: Some(path),
                    kind: FailureKind::from(&e),
                    message: e.to_string(),
                });
                OutputStatus::WriteFailed(e.to_string())
            }
        };
        OutputInfo { label, status }
    };

    for result in &set.variants {
        match result {
            Ok(variant) => {
                outcome.variants_generated += 1;
                let i = variant.index;
                outputs.push(save(&variant.image, OutputKind::Variant(i), Some(i), &mut outcome));
                if let Some(mirrored) = &variant.mirrored {
                    let kind = OutputKind::MirroredVariant(i);
                    outputs.push(save(mirrored, kind, Some(i), &mut outcome));
                }
            }
            Err(failure) => {
                log::warn!(
                    "{}: variant {} aborted: {}",
                    source_path,
                    failure.index,
                    failure.error
                );
                log::debug!("Aborted plan: {:?}", failure.plan);
                outcome.variants_failed += 1;
                outcome.failures.push(Failure {
                    source: source.relative.clone(),
                    variant: Some(failure.index),
                    output: None,
                    kind: FailureKind::from(&failure.error),
                    message: failure.error.to_string(),
                });
                let kind = OutputKind::Variant(failure.index);
                let path = output_path(output_dir, &source.relative, kind);
                outputs.push(OutputInfo {
                    label: file_label(&path),
                    status: OutputStatus::TransformFailed(failure.error.to_string()),
                });
            }
        }
    }

    match &set.mirrored_original {
        Some(Ok(mirrored)) => {
            outputs.push(save(mirrored, OutputKind::MirroredOriginal, None, &mut outcome));
        }
        Some(Err(e)) => {
            log::warn!("{source_path}: mirrored copy aborted: {e}");
            outcome.failures.push(Failure {
                source: source.relative.clone(),
                variant: None,
                output: None,
                kind: FailureKind::from(e),
                message: e.to_string(),
            });
            let path = output_path(output_dir, &source.relative, OutputKind::MirroredOriginal);
            outputs.push(OutputInfo {
                label: file_label(&path),
                status: OutputStatus::TransformFailed(e.to_string()),
            });
        }
        None => {}
    }

    let event = ProcessEvent::ImageProcessed {
        index,
        source_path,
        outputs,
    };
    (outcome, event)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
