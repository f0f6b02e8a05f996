//! High-level image operations.
//!
//! These functions combine calculations with codec execution. Compression is
//! an optimization, never a correctness requirement: [`compress`] always
//! returns something uploadable, falling back to the validated bytes when the
//! codec fails or cannot make the file smaller.

use super::backend::{BackendError, Dimensions, ImageCodec};
use super::calculations::calculate_bounded_dimensions;
use super::params::{CompressParams, ImageKind, TranscodeParams};
use super::validate::ValidatedAsset;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the codec.
pub fn get_dimensions(codec: &(impl ImageCodec + ?Sized), bytes: &[u8]) -> Result<(u32, u32)> {
    let dims = codec.identify(bytes)?;
    Ok((dims.width, dims.height))
}

/// Why the original bytes were kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The format is uploaded as-is (GIF).
    Passthrough,
    /// Re-encoding produced a file at least as large as the original.
    NotSmaller { encoded_len: usize },
    /// Decode or encode failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    Compressed { original_len: usize },
    Kept(FallbackReason),
}

/// The bytes that will actually be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Output dimensions when the codec got far enough to know them.
    pub dimensions: Option<Dimensions>,
    pub outcome: CompressionOutcome,
}

impl EncodedAsset {
    /// The validated asset, unchanged.
    pub fn original(asset: &ValidatedAsset, reason: FallbackReason) -> Self {
        Self {
            file_name: asset.file_name().to_string(),
            content_type: asset.kind().mime().to_string(),
            bytes: asset.bytes().to_vec(),
            dimensions: None,
            outcome: CompressionOutcome::Kept(reason),
        }
    }

    pub fn was_compressed(&self) -> bool {
        matches!(self.outcome, CompressionOutcome::Compressed { .. })
    }
}

/// Plan a transcode without executing it.
///
/// Keeps the source format and fits the dimensions inside the bounds.
pub fn plan_compression(
    original: Dimensions,
    format: ImageKind,
    params: &CompressParams,
) -> TranscodeParams {
    let (width, height) = calculate_bounded_dimensions(
        (original.width, original.height),
        (params.max_width, params.max_height),
    );

    TranscodeParams {
        format,
        width,
        height,
        quality: params.quality,
    }
}

/// Compress a validated asset, best effort.
pub fn compress(
    codec: &(impl ImageCodec + ?Sized),
    asset: &ValidatedAsset,
    params: &CompressParams,
) -> EncodedAsset {
    if asset.kind() == ImageKind::Gif {
        return EncodedAsset::original(asset, FallbackReason::Passthrough);
    }

    let attempt = codec.identify(asset.bytes()).and_then(|dims| {
        let plan = plan_compression(dims, asset.kind(), params);
        let bytes = codec.transcode(asset.bytes(), &plan)?;
        Ok((bytes, plan))
    });

    match attempt {
        Ok((bytes, _)) if bytes.len() >= asset.len() => {
            tracing::debug!(
                file = asset.file_name(),
                original = asset.len(),
                encoded = bytes.len(),
                "re-encoding did not shrink image; keeping original"
            );
            EncodedAsset::original(
                asset,
                FallbackReason::NotSmaller {
                    encoded_len: bytes.len(),
                },
            )
        }
        Ok((bytes, plan)) => {
            tracing::debug!(
                file = asset.file_name(),
                original = asset.len(),
                encoded = bytes.len(),
                width = plan.width,
                height = plan.height,
                "compressed image"
            );
            EncodedAsset {
                file_name: asset.file_name().to_string(),
                content_type: plan.format.mime().to_string(),
                bytes,
                dimensions: Some(Dimensions {
                    width: plan.width,
                    height: plan.height,
                }),
                outcome: CompressionOutcome::Compressed {
                    original_len: asset.len(),
                },
            }
        }
        Err(e) => {
            tracing::warn!(file = asset.file_name(), error = %e, "compression failed; uploading original");
            EncodedAsset::original(asset, FallbackReason::Failed(e.to_string()))
        }
    }
}
