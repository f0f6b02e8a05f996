//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the target size and format) and the
//! [`backend`](super::backend) (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`ImageKind`] — The four upload formats, keyed by MIME type.
//! - [`CompressParams`] — Caller-facing bounds and quality for a compression.
//! - [`TranscodeParams`] — Full specification for one transcode: format, exact dimensions, quality.

use crate::config::UploadConfig;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    pub const ALL: [ImageKind; 4] = [ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif, ImageKind::WebP];

    /// Parse a declared MIME type.
    ///
    /// Case-insensitive, ignores parameters (`image/png; charset=binary`), and
    /// accepts the non-standard `image/jpg` alias some browsers report.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            "image/webp" => Some(ImageKind::WebP),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::WebP => "image/webp",
        }
    }

    /// Short human label used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Gif => "GIF",
            ImageKind::WebP => "WebP",
        }
    }
}

/// Bounds and quality for compressing an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressParams {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl CompressParams {
    pub fn from_upload_config(config: &UploadConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: Quality::new(config.quality),
        }
    }
}

impl Default for CompressParams {
    fn default() -> Self {
        Self::from_upload_config(&UploadConfig::default())
    }
}

/// Parameters for a single transcode: decode, resize to exactly
/// `width`x`height`, encode as `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeParams {
    pub format: ImageKind,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
