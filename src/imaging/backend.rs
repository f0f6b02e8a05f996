//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the two operations every codec must
//! support: identify and transcode. Both work on in-memory bytes, since an
//! upload never touches the filesystem once the file has been picked.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` crate.

use super::params::TranscodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codecs.
///
/// Codecs are CPU-bound and run on the blocking pool, hence `Send + Sync`.
pub trait ImageCodec: Send + Sync {
    /// Get image dimensions without a full decode where the format allows it.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, resize to the exact target dimensions, and re-encode.
    fn transcode(&self, bytes: &[u8], params: &TranscodeParams) -> Result<Vec<u8>, BackendError>;
}
