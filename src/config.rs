//! Run configuration.
//!
//! Handles loading, validating, and merging `augment.toml`. Stock defaults
//! reproduce the classic pipeline (five variants per image, each mirrored);
//! a config file overrides any subset of keys, and CLI flags override the
//! file.
//!
//! ## Config File Location
//!
//! `--config path/to/file.toml` if given, otherwise `augment.toml` in the
//! working directory if present, otherwise stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [variants]
//! count = 5                     # Variants generated per source image
//! mirror = "per-variant"        # per-variant | per-original | off
//! # seed = 42                   # Omit for a fresh random seed per run
//! transform_probability = 1.0   # Chance each transform joins a variant
//! max_retries = 32              # Re-draws allowed to avoid duplicate plans
//!
//! [ranges]                      # [min, max], sampled uniformly
//! translate = [-2.0, 2.0]       # Pixels
//! rotate = [-4.0, 4.0]          # Degrees, counter-clockwise
//! warp_amplitude = [0.5, 1.0]   # Pixels
//! warp_frequency = [1.0, 5.0]   # Periods across the image
//! blur = [0.0, 0.5]             # Gaussian sigma or box radius, pixels
//! brightness = [-0.05, 0.05]    # Fraction of full scale
//! contrast = [1.0, 1.2]         # Factor around mid-grey
//!
//! [geometry]
//! interpolation = "bilinear"    # nearest | bilinear
//! fill = "constant"             # constant | clamp
//! fill_level = 0.0              # Grey level for constant fill (0-1)
//! rotate_expand = false         # Grow canvas instead of cropping corners
//! translate_independent_axes = false
//!
//! [extras]
//! blur_kind = "gaussian"        # gaussian | box
//! flip_probability = 0.0        # Vertical flip
//! fireflies_probability = 0.0   # Random grey speckles
//! fireflies_fraction = [0.0, 0.01]
//! fireflies_level = [0.0, 1.0]
//!
//! [scan]
//! recursive = false
//! extensions = ["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp"]
//!
//! [output]
//! quality = 90                  # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{FillPolicy, Interpolation, supported_input_extensions};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "augment.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(std::path::PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full run configuration loaded from `augment.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentConfig {
    /// How many variants, mirroring, seed.
    pub variants: VariantsConfig,
    /// Parameter ranges the generator samples from.
    pub ranges: RangesConfig,
    /// Sampling and edge handling for geometric transforms.
    pub geometry: GeometryConfig,
    /// Optional transforms, all off by default.
    pub extras: ExtrasConfig,
    /// Input discovery.
    pub scan: ScanConfig,
    /// Encoding settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AugmentConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Only structural checks happen here (ordered ranges, probabilities,
    /// counts). Whether a sampled value suits a transform is decided by the
    /// transform itself, per variant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variants.count == 0 {
            return Err(ConfigError::Validation(
                "variants.count must be at least 1".into(),
            ));
        }
        check_probability(
            "variants.transform_probability",
            self.variants.transform_probability,
        )?;
        check_probability("extras.flip_probability", self.extras.flip_probability)?;
        check_probability(
            "extras.fireflies_probability",
            self.extras.fireflies_probability,
        )?;
        for (name, range) in self.ranges.named() {
            range.check(name)?;
        }
        self.extras.fireflies_fraction.check("extras.fireflies_fraction")?;
        self.extras.fireflies_level.check("extras.fireflies_level")?;
        if !(0.0..=1.0).contains(&self.geometry.fill_level) {
            return Err(ConfigError::Validation(
                "geometry.fill_level must be 0-1".into(),
            ));
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation("output.quality must be 1-100".into()));
        }
        if self.scan.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "scan.extensions must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn check_probability(name: &str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be 0-1")))
    }
}

/// Inclusive `[min, max]` range written as a two-element TOML array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform draw from the range. A degenerate range returns `min` without
    /// consuming randomness.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.min == self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }

    fn check(&self, name: &str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::Validation(format!("{name} must be finite")));
        }
        if self.min > self.max {
            return Err(ConfigError::Validation(format!(
                "{name} min ({}) is greater than max ({})",
                self.min, self.max
            )));
        }
        // Uniform sampling needs a finite width
        if !(self.max - self.min).is_finite() {
            return Err(ConfigError::Validation(format!(
                "{name} spans more than a float can represent"
            )));
        }
        Ok(())
    }
}

impl From<[f32; 2]> for ParamRange {
    fn from([min, max]: [f32; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ParamRange> for [f32; 2] {
    fn from(r: ParamRange) -> Self {
        [r.min, r.max]
    }
}

/// Which images get a horizontally mirrored copy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorPolicy {
    /// One mirrored copy of every variant.
    #[default]
    PerVariant,
    /// One mirrored copy of the untouched source image.
    PerOriginal,
    /// No mirrored copies.
    Off,
}

/// Variant generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    /// Variants generated per source image.
    pub count: usize,
    /// Mirrored-copy policy.
    pub mirror: MirrorPolicy,
    /// Run seed. `None` draws a fresh one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Probability that each transform is part of a given variant.
    pub transform_probability: f64,
    /// Re-draws allowed when a sampled plan repeats an earlier one.
    pub max_retries: usize,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            count: 5,
            mirror: MirrorPolicy::PerVariant,
            seed: None,
            transform_probability: 1.0,
            max_retries: 32,
        }
    }
}

/// Sampling ranges for the core transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RangesConfig {
    pub translate: ParamRange,
    pub rotate: ParamRange,
    pub warp_amplitude: ParamRange,
    pub warp_frequency: ParamRange,
    pub blur: ParamRange,
    pub brightness: ParamRange,
    pub contrast: ParamRange,
}

impl RangesConfig {
    fn named(&self) -> [(&'static str, ParamRange); 7] {
        [
            ("ranges.translate", self.translate),
            ("ranges.rotate", self.rotate),
            ("ranges.warp_amplitude", self.warp_amplitude),
            ("ranges.warp_frequency", self.warp_frequency),
            ("ranges.blur", self.blur),
            ("ranges.brightness", self.brightness),
            ("ranges.contrast", self.contrast),
        ]
    }
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            translate: ParamRange::new(-2.0, 2.0),
            rotate: ParamRange::new(-4.0, 4.0),
            warp_amplitude: ParamRange::new(0.5, 1.0),
            warp_frequency: ParamRange::new(1.0, 5.0),
            blur: ParamRange::new(0.0, 0.5),
            brightness: ParamRange::new(-0.05, 0.05),
            contrast: ParamRange::new(1.0, 1.2),
        }
    }
}

/// Edge handling for geometric transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[default]
    Constant,
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    pub interpolation: Interpolation,
    pub fill: FillMode,
    /// Grey level used by constant fill, 0 (black) to 1 (white).
    pub fill_level: f32,
    /// Grow the canvas on rotation instead of cropping the corners.
    pub rotate_expand: bool,
    /// Draw separate x and y shifts instead of one shared shift.
    pub translate_independent_axes: bool,
}

impl GeometryConfig {
    pub fn fill_policy(&self) -> FillPolicy {
        match self.fill {
            FillMode::Constant => FillPolicy::Constant(self.fill_level),
            FillMode::Clamp => FillPolicy::Clamp,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            fill: FillMode::Constant,
            fill_level: 0.0,
            rotate_expand: false,
            translate_independent_axes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurKind {
    #[default]
    Gaussian,
    Box,
}

/// Optional transforms. All disabled by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtrasConfig {
    pub blur_kind: BlurKind,
    pub flip_probability: f64,
    pub fireflies_probability: f64,
    pub fireflies_fraction: ParamRange,
    pub fireflies_level: ParamRange,
}

impl Default for ExtrasConfig {
    fn default() -> Self {
        Self {
            blur_kind: BlurKind::Gaussian,
            flip_probability: 0.0,
            fireflies_probability: 0.0,
            fireflies_fraction: ParamRange::new(0.0, 0.01),
            fireflies_level: ParamRange::new(0.0, 1.0),
        }
    }
}

/// Input discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Descend into sub-directories, mirroring them in the output.
    pub recursive: bool,
    /// File extensions treated as images (case-insensitive).
    pub extensions: Vec<String>,
}

impl ScanConfig {
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: supported_input_extensions()
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AugmentConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AugmentConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AugmentConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the run configuration.
///
/// An explicit path must exist. Without one, `augment.toml` in `dir` is used
/// when present; otherwise the stock defaults apply.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<AugmentConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            Some(load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?)
        }
        None => load_raw_config(&dir.join(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `augment.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-augment configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Ranges are [min, max] and are sampled uniformly for every variant.

# ---------------------------------------------------------------------------
# Variant generation
# ---------------------------------------------------------------------------
[variants]
# Variants generated per source image.
count = 5

# Mirrored copies: "per-variant" (one per variant), "per-original"
# (one of the untouched source), or "off".
mirror = "per-variant"

# Fixed seed for reproducible output. Omit for a fresh seed every run;
# the seed used is printed so a run can be repeated.
# seed = 42

# Probability that each transform takes part in a variant.
# 1.0 applies all of them, in order: translate, rotate, warp, blur,
# brightness, contrast.
transform_probability = 1.0

# Re-draws allowed when a sampled parameter set repeats an earlier one.
max_retries = 32

# ---------------------------------------------------------------------------
# Parameter ranges
# ---------------------------------------------------------------------------
[ranges]
translate = [-2.0, 2.0]       # pixels
rotate = [-4.0, 4.0]          # degrees, counter-clockwise
warp_amplitude = [0.5, 1.0]   # pixels
warp_frequency = [1.0, 5.0]   # periods across the image
blur = [0.0, 0.5]             # Gaussian sigma (or box radius), pixels
brightness = [-0.05, 0.05]    # offset as a fraction of full scale
contrast = [1.0, 1.2]         # factor around mid-grey

# ---------------------------------------------------------------------------
# Geometry
# ---------------------------------------------------------------------------
[geometry]
# "nearest" or "bilinear".
interpolation = "bilinear"

# Pixels exposed by translation/rotation: "constant" grey or "clamp"
# (repeat the nearest edge pixel).
fill = "constant"
fill_level = 0.0

# Grow the canvas so rotated corners are kept.
rotate_expand = false

# Draw separate x and y shifts instead of a single diagonal shift.
translate_independent_axes = false

# ---------------------------------------------------------------------------
# Extra transforms (off by default)
# ---------------------------------------------------------------------------
[extras]
# "gaussian" or "box".
blur_kind = "gaussian"

# Chance of a vertical flip.
flip_probability = 0.0

# Chance of random grey speckles, the fraction of pixels affected, and
# their grey level.
fireflies_probability = 0.0
fireflies_fraction = [0.0, 0.01]
fireflies_level = [0.0, 1.0]

# ---------------------------------------------------------------------------
# Input
# ---------------------------------------------------------------------------
[scan]
# Descend into sub-directories, mirroring them under the output directory.
recursive = false
extensions = ["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp"]

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1-100). Other formats are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
