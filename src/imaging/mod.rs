//! Client-side image preparation — pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Validate** | declared size (≤ 5 MB) and MIME allow-list, no decoding |
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Compress** | Lanczos3 resize into bounds + re-encode in the source format |
//!
//! The module is split into:
//! - **Validation**: [`validate`] / [`check`] over an [`ImageAsset`]
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: [`compress`], which combines calculations + codec with fallback

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod validate;

pub use backend::{BackendError, Dimensions, ImageCodec};
pub use calculations::{calculate_bounded_dimensions, calculate_scale};
pub use operations::{
    CompressionOutcome, EncodedAsset, FallbackReason, compress, get_dimensions, plan_compression,
};
pub use params::{CompressParams, ImageKind, Quality, TranscodeParams};
pub use rust_backend::RustCodec;
pub use validate::{
    ImageAsset, MAX_UPLOAD_BYTES, ValidatedAsset, Validation, ValidationError, check, validate,
};
