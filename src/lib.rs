//! # Simple Augment
//!
//! A small batch tool that enlarges an image training set. Every image in the
//! input directory gets `N` randomized variants (translation, rotation,
//! wave-warp, blur, brightness, contrast) plus horizontally mirrored copies,
//! written next to each other in the output directory.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      Train/    →  Manifest      (which files, how big, what was skipped)
//! 2. Generate  image     →  VariantSet    (sampled plans, transformed pixels)
//! 3. Write     variants  →  Export/       (derived filenames, RunReport)
//! ```
//!
//! Stages 2 and 3 run per file on a rayon pool. Each file has its own RNG
//! derived from the run seed, so a seed reproduces a run byte for byte.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: lists input images, probes headers, records skips |
//! | [`variants`] | Stage 2: samples distinct plans and applies them |
//! | [`process`] | Stage 3: orchestrates load, generate and write; builds the run report |
//! | [`imaging`] | Transform library and the image I/O backend |
//! | [`naming`] | Output filename convention (`cat_0.png`, `cat_0_mirrored.png`) |
//! | [`config`] | `augment.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting for check, progress and summary |
//!
//! # Design Decisions
//!
//! ## Plans Before Pixels
//!
//! The generator samples every plan for a file before running any transform.
//! A variant that fails (say, a configured blur range dipping below zero)
//! therefore leaves the random stream, and every other variant, untouched.
//!
//! ## Failures Are Data
//!
//! Unreadable sources, aborted variants and failed writes never stop a run.
//! They land in [`process::RunReport`], are logged, and turn the exit code
//! non-zero.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod variants;
