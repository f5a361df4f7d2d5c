//! Image processing: pure Rust, built on the `image` crate.
//!
//! | Concern | Where |
//! |---|---|
//! | **Probe / load / save** | [`ImageBackend`] + [`RustBackend`] |
//! | **Geometry math** | [`calculations`] (rotation bounds, inverse maps, warp) |
//! | **Transforms** | [`operations`] (translate, rotate, warp, blur, brightness, ...) |
//!
//! The module is split into:
//! - **Calculations**: Pure coordinate math (unit testable without images)
//! - **Parameters**: Data structures describing each transform
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Pixel-level transforms over [`image::DynamicImage`]

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::TransformError;
pub use params::{
    BoxBlur, Brightness, Contrast, FillPolicy, Fireflies, GaussianBlur, Interpolation, Quality,
    RotateOptions, Rotation, Translation, Warp,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
