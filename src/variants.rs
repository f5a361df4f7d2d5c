//! Variant generation.
//!
//! Stage 2 of the augmentation pipeline. For one source image, samples `N`
//! distinct [`VariantPlan`]s from the configured ranges, applies each plan's
//! transforms in a fixed order, and adds mirrored copies per
//! [`MirrorPolicy`].
//!
//! ## Composition order
//!
//! translate → rotate → warp → blur → brightness → contrast → flip →
//! fireflies
//!
//! Each core transform joins a plan with `transform_probability`; when the
//! draw selects none, one is picked uniformly so no variant is a plain copy.
//! The optional extras (flip, fireflies) have their own probabilities.
//!
//! ## Determinism
//!
//! All randomness comes from the caller's RNG, and every plan is sampled
//! before any transform runs. The same seed therefore yields the same plans
//! and the same pixels regardless of which variants later fail.

use crate::config::{AugmentConfig, BlurKind, ExtrasConfig, MirrorPolicy, RangesConfig};
use crate::imaging::operations::{self, TransformError};
use crate::imaging::{
    BoxBlur, Brightness, Contrast, FillPolicy, Fireflies, GaussianBlur, Interpolation,
    RotateOptions, Rotation, Translation, Warp,
};
use image::DynamicImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of core transforms eligible for selection.
const CORE_TRANSFORMS: usize = 6;

/// Everything the generator needs, flattened from [`AugmentConfig`].
///
/// Assumes a validated config: ranges ordered, probabilities within 0..=1.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub count: usize,
    pub mirror: MirrorPolicy,
    pub transform_probability: f64,
    pub max_retries: usize,
    pub ranges: RangesConfig,
    pub interpolation: Interpolation,
    pub fill: FillPolicy,
    pub rotate_expand: bool,
    pub translate_independent_axes: bool,
    pub extras: ExtrasConfig,
}

impl GeneratorConfig {
    pub fn from_config(config: &AugmentConfig) -> Self {
        Self {
            count: config.variants.count,
            mirror: config.variants.mirror,
            transform_probability: config.variants.transform_probability,
            max_retries: config.variants.max_retries,
            ranges: config.ranges.clone(),
            interpolation: config.geometry.interpolation,
            fill: config.geometry.fill_policy(),
            rotate_expand: config.geometry.rotate_expand,
            translate_independent_axes: config.geometry.translate_independent_axes,
            extras: config.extras.clone(),
        }
    }

    fn rotate_options(&self) -> RotateOptions {
        RotateOptions {
            interpolation: self.interpolation,
            fill: self.fill,
            expand: self.rotate_expand,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_config(&AugmentConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blur {
    Gaussian(GaussianBlur),
    Box(BoxBlur),
}

/// Speckle parameters plus the seed of the RNG that places them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirefliesPlan {
    pub params: Fireflies,
    pub seed: u64,
}

/// The sampled parameters that define one variant. `None` means the
/// transform is skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantPlan {
    pub translate: Option<Translation>,
    pub rotate: Option<Rotation>,
    pub warp: Option<Warp>,
    pub blur: Option<Blur>,
    pub brightness: Option<Brightness>,
    pub contrast: Option<Contrast>,
    pub flip: bool,
    pub fireflies: Option<FirefliesPlan>,
}

impl VariantPlan {
    /// Same transforms with the same parameters. Fireflies seeds are not
    /// compared.
    pub fn same_effect(&self, other: &Self) -> bool {
        self.translate == other.translate
            && self.rotate == other.rotate
            && self.warp == other.warp
            && self.blur == other.blur
            && self.brightness == other.brightness
            && self.contrast == other.contrast
            && self.flip == other.flip
            && self.fireflies.map(|f| f.params) == other.fireflies.map(|f| f.params)
    }

    /// Number of transforms the plan applies.
    pub fn transform_count(&self) -> usize {
        [
            self.translate.is_some(),
            self.rotate.is_some(),
            self.warp.is_some(),
            self.blur.is_some(),
            self.brightness.is_some(),
            self.contrast.is_some(),
            self.flip,
            self.fireflies.is_some(),
        ]
        .into_iter()
        .filter(|&on| on)
        .count()
    }
}

/// Draw one plan from the configured ranges.
pub fn sample_plan(cfg: &GeneratorConfig, rng: &mut impl Rng) -> VariantPlan {
    let mut selected = [false; CORE_TRANSFORMS];
    for on in selected.iter_mut() {
        *on = rng.random_bool(cfg.transform_probability);
    }
    if !selected.contains(&true) {
        selected[rng.random_range(0..CORE_TRANSFORMS)] = true;
    }
    let [translate, rotate, warp, blur, brightness, contrast] = selected;
    let ranges = &cfg.ranges;

    let mut plan = VariantPlan::default();
    if translate {
        let dx = ranges.translate.sample(rng);
        let dy = if cfg.translate_independent_axes {
            ranges.translate.sample(rng)
        } else {
            dx
        };
        plan.translate = Some(Translation { dx, dy });
    }
    if rotate {
        plan.rotate = Some(Rotation {
            degrees: ranges.rotate.sample(rng),
        });
    }
    if warp {
        plan.warp = Some(Warp {
            amplitude: ranges.warp_amplitude.sample(rng),
            frequency: ranges.warp_frequency.sample(rng),
        });
    }
    if blur {
        let amount = ranges.blur.sample(rng);
        plan.blur = Some(match cfg.extras.blur_kind {
            BlurKind::Gaussian => Blur::Gaussian(GaussianBlur { sigma: amount }),
            BlurKind::Box => Blur::Box(BoxBlur { radius: amount }),
        });
    }
    if brightness {
        plan.brightness = Some(Brightness {
            delta: ranges.brightness.sample(rng),
        });
    }
    if contrast {
        plan.contrast = Some(Contrast {
            factor: ranges.contrast.sample(rng),
        });
    }

    plan.flip = rng.random_bool(cfg.extras.flip_probability);
    if rng.random_bool(cfg.extras.fireflies_probability) {
        plan.fireflies = Some(FirefliesPlan {
            params: Fireflies {
                fraction: cfg.extras.fireflies_fraction.sample(rng),
                level: cfg.extras.fireflies_level.sample(rng),
            },
            seed: rng.random(),
        });
    }
    plan
}

/// Draw `cfg.count` plans, re-drawing any that repeat an earlier one.
///
/// After `max_retries` failed re-draws the duplicate is kept.
pub fn sample_plans(cfg: &GeneratorConfig, rng: &mut impl Rng) -> Vec<VariantPlan> {
    let mut plans: Vec<VariantPlan> = Vec::with_capacity(cfg.count);
    for index in 0..cfg.count {
        let mut plan = sample_plan(cfg, rng);
        let mut retries = 0;
        while plans.iter().any(|p| p.same_effect(&plan)) {
            if retries == cfg.max_retries {
                log::warn!(
                    "Variant {index} repeats an earlier plan after {retries} re-draws; keeping it"
                );
                break;
            }
            plan = sample_plan(cfg, rng);
            retries += 1;
        }
        plans.push(plan);
    }
    plans
}

/// Apply a plan's transforms in composition order.
pub fn apply_plan(
    img: &DynamicImage,
    plan: &VariantPlan,
    cfg: &GeneratorConfig,
) -> Result<DynamicImage, TransformError> {
    operations::ensure_supported(img)?;
    let mut out = img.clone();

    if let Some(t) = plan.translate {
        out = operations::translate(&out, t, cfg.interpolation, cfg.fill)?;
    }
    if let Some(r) = plan.rotate {
        out = operations::rotate(&out, r, cfg.rotate_options())?;
    }
    if let Some(w) = plan.warp {
        out = operations::warp(&out, w)?;
    }
    match plan.blur {
        Some(Blur::Gaussian(b)) => out = operations::gaussian_blur(&out, b)?,
        Some(Blur::Box(b)) => out = operations::box_blur(&out, b)?,
        None => {}
    }
    if let Some(b) = plan.brightness {
        out = operations::brightness(&out, b)?;
    }
    if let Some(c) = plan.contrast {
        out = operations::contrast(&out, c)?;
    }
    if plan.flip {
        out = operations::flip(&out)?;
    }
    if let Some(f) = plan.fireflies {
        let mut rng = StdRng::seed_from_u64(f.seed);
        out = operations::fireflies(&out, f.params, &mut rng)?;
    }
    Ok(out)
}

/// A successfully generated variant.
#[derive(Debug, Clone)]
pub struct Variant {
    pub index: usize,
    pub plan: VariantPlan,
    pub image: DynamicImage,
    /// Horizontal flip of `image`, present under [`MirrorPolicy::PerVariant`].
    pub mirrored: Option<DynamicImage>,
}

/// A variant whose transforms failed. Other variants are unaffected.
#[derive(Debug, Clone)]
pub struct VariantFailure {
    pub index: usize,
    pub plan: VariantPlan,
    pub error: TransformError,
}

/// Everything generated from one source image.
#[derive(Debug)]
pub struct VariantSet {
    /// One outcome per variant index, in order.
    pub variants: Vec<Result<Variant, VariantFailure>>,
    /// Present under [`MirrorPolicy::PerOriginal`].
    pub mirrored_original: Option<Result<DynamicImage, TransformError>>,
}

impl VariantSet {
    pub fn succeeded(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter_map(|v| v.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &VariantFailure> {
        self.variants.iter().filter_map(|v| v.as_ref().err())
    }
}

/// Produce `cfg.count` variants of `img` plus mirrored copies.
pub fn generate_variants(
    img: &DynamicImage,
    cfg: &GeneratorConfig,
    rng: &mut impl Rng,
) -> VariantSet {
    let plans = sample_plans(cfg, rng);

    let variants = plans
        .into_iter()
        .enumerate()
        .map(|(index, plan)| {
            log::debug!("Variant {index}: {} transforms", plan.transform_count());
            let result = apply_plan(img, &plan, cfg).and_then(|image| {
                let mirrored = match cfg.mirror {
                    MirrorPolicy::PerVariant => Some(operations::mirror(&image)?),
                    MirrorPolicy::PerOriginal | MirrorPolicy::Off => None,
                };
                Ok((image, mirrored))
            });
            match result {
                Ok((image, mirrored)) => Ok(Variant {
                    index,
                    plan,
                    image,
                    mirrored,
                }),
                Err(error) => Err(VariantFailure { index, plan, error }),
            }
        })
        .collect();

    let mirrored_original = match cfg.mirror {
        MirrorPolicy::PerOriginal => Some(operations::mirror(img)),
        MirrorPolicy::PerVariant | MirrorPolicy::Off => None,
    };

    VariantSet {
        variants,
        mirrored_original,
    }
}
