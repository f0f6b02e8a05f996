//! Pure Rust image codec.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP) | `image::ImageReader::decode` with format sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, best compression, adaptive filter |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//!
//! GIF is never re-encoded: the decoder yields only the first frame, so
//! transcoding would silently drop animation.

use super::backend::{BackendError, Dimensions, ImageCodec};
use super::params::{ImageKind, TranscodeParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::io::Cursor;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Decode an image from memory, sniffing the format from its magic bytes.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    reader(bytes)?
        .decode()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {}", e)))
}

/// Encode `img` into a fresh buffer.
fn encode_image(img: &DynamicImage, format: ImageKind, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    match format {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, quality as u8)
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
        }
        ImageKind::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
        }
        ImageKind::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))
                .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
        }
        ImageKind::Gif => {
            return Err(BackendError::ProcessingFailed(
                "GIF re-encoding is not supported".into(),
            ));
        }
    }
    Ok(out)
}

impl ImageCodec for RustCodec {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(bytes)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn transcode(&self, bytes: &[u8], params: &TranscodeParams) -> Result<Vec<u8>, BackendError> {
        if params.format == ImageKind::Gif {
            return Err(BackendError::ProcessingFailed(
                "GIF re-encoding is not supported".into(),
            ));
        }
        let img = load_image(bytes)?;
        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        encode_image(&resized, params.format, params.quality.value())
    }
}
