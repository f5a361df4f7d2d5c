//! Output filename convention.
//!
//! Every generated file is named after its source so lineage can be read off
//! the output directory:
//!
//! - `cat.png` variant 0 → `cat_0.png`
//! - its mirrored copy → `cat_0_mirrored.png`
//! - mirrored original (per-original policy) → `cat_mirrored.png`
//!
//! Stem and extension are split on the last dot, so `a.b.jpg` keeps the stem
//! `a.b`. When scanning recursively the source's sub-directory is kept under
//! the output root.

use std::path::{Path, PathBuf};

/// Suffix marking a horizontally mirrored output.
pub const MIRROR_SUFFIX: &str = "mirrored";

/// What an output file holds relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Variant `index`.
    Variant(usize),
    /// Mirrored copy of variant `index`.
    MirroredVariant(usize),
    /// Mirrored copy of the untouched source.
    MirroredOriginal,
}

/// Split a file name into stem and extension on the last dot.
///
/// A leading dot (hidden file) is part of the stem.
pub fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(pos) => (&file_name[..pos], Some(&file_name[pos + 1..])),
    }
}

/// File name for one output of `source_name`.
pub fn variant_file_name(source_name: &str, kind: OutputKind) -> String {
    let (stem, ext) = split_name(source_name);
    let base = match kind {
        OutputKind::Variant(i) => format!("{stem}_{i}"),
        OutputKind::MirroredVariant(i) => format!("{stem}_{i}_{MIRROR_SUFFIX}"),
        OutputKind::MirroredOriginal => format!("{stem}_{MIRROR_SUFFIX}"),
    };
    match ext {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

/// Full output path for `relative` (a path relative to the input root).
pub fn output_path(output_root: &Path, relative: &Path, kind: OutputKind) -> PathBuf {
    let name = relative
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let file = variant_file_name(&name, kind);
    match relative.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => output_root.join(dir).join(file),
        _ => output_root.join(file),
    }
}
