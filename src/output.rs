//! CLI output formatting for the pipeline stages.
//!
//! # Entity Display Contract
//!
//! Every source image follows the same two-level pattern in every stage:
//!
//! 1. **Header line**: positional index + path relative to the input root
//! 2. **Context lines**: indented detail (dimensions, outputs, errors)
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Images (2)
//! 001 cat.png (640x480)
//! 002 birds/owl.jpg (320x240)
//!
//! Skipped (1)
//!     notes.txt: not an image
//! ```
//!
//! ## Run
//!
//! ```text
//! 001 cat.png
//!     cat_0.png: written
//!     cat_0_mirrored.png: written
//!     cat_1.png: failed (Invalid parameter blur.sigma = -0.2: must be >= 0)
//! 002 broken.png
//!     unreadable: Cannot read broken.png: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Seed: 1234 (pass --seed 1234 to reproduce)
//! Images: 2 processed, 1 unreadable
//! Variants: 4 generated, 1 failed
//! Files written: 8
//!
//! Failures (2)
//!     broken.png: read: Cannot read broken.png: ...
//!     cat.png [1]: invalid_parameter: Invalid parameter blur.sigma = -0.2: ...
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{FailureKind, OutputStatus, ProcessEvent, RunReport};
use crate::scan::Manifest;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header for one source image: `001 birds/owl.jpg`.
fn image_line(index: usize, relative: &str) -> String {
    format!("{} {}", format_index(index), relative)
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

fn kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Read => "read",
        FailureKind::Write => "write",
        FailureKind::InvalidParameter => "invalid_parameter",
        FailureKind::UnsupportedFormat => "unsupported_format",
    }
}

// ============================================================================
// Check: scan output
// ============================================================================

/// Format the scan result: images to process, then skipped files.
pub fn format_scan_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("Images ({})", manifest.images.len()));
    for (i, img) in manifest.images.iter().enumerate() {
        lines.push(format!(
            "{} ({}x{})",
            image_line(i + 1, &img.relative.to_string_lossy()),
            img.width,
            img.height
        ));
    }

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push(format!("Skipped ({})", manifest.skipped.len()));
        for skipped in &manifest.skipped {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                display_relative(&skipped.path, &manifest.root),
                skipped.reason
            ));
        }
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest) {
    for line in format_scan_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Run: progress events
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ImageProcessed {
            index,
            source_path,
            outputs,
        } => {
            let mut lines = vec![image_line(*index, source_path)];
            for output in outputs {
                let status = match &output.status {
                    OutputStatus::Written => "written".to_string(),
                    OutputStatus::TransformFailed(e) => format!("failed ({e})"),
                    OutputStatus::WriteFailed(e) => format!("write failed ({e})"),
                };
                lines.push(format!("{}{}: {}", indent(1), output.label, status));
            }
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            source_path,
            error,
        } => vec![
            image_line(*index, source_path),
            format!("{}unreadable: {}", indent(1), error),
        ],
    }
}

// ============================================================================
// Run: summary
// ============================================================================

/// Format the end-of-run summary with counts and every failure.
pub fn format_summary(report: &RunReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Seed: {} (pass --seed {} to reproduce)",
            report.seed, report.seed
        ),
        format!(
            "Images: {} processed, {} unreadable",
            report.sources - report.sources_failed,
            report.sources_failed
        ),
        format!(
            "Variants: {} generated, {} failed",
            report.variants_generated, report.variants_failed
        ),
        format!("Files written: {}", report.files_written),
    ];

    if !report.skipped.is_empty() {
        lines.push(format!(
            "Skipped: {}",
            plural(report.skipped.len(), "file", "files")
        ));
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("Failures ({})", report.failures.len()));
        for failure in &report.failures {
            let variant = failure
                .variant
                .map(|v| format!(" [{v}]"))
                .unwrap_or_default();
            lines.push(format!(
                "{}{}{}: {}: {}",
                indent(1),
                failure.source.to_string_lossy(),
                variant,
                kind_label(failure.kind),
                failure.message
            ));
        }
    }

    lines
}

/// Print the summary to stdout.
pub fn print_summary(report: &RunReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}
