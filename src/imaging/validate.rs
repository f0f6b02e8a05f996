//! Synchronous pre-flight check of a candidate upload.
//!
//! Runs before anything else in the upload path so an invalid file never
//! costs a network round-trip. Only the declared size and type are checked;
//! the bytes are not decoded here.

use super::params::ImageKind;
use std::path::Path;
use thiserror::Error;

/// Largest accepted upload, inclusive: 5 MB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Image file is empty")]
    Empty,
    #[error("Image must be 5 MB or smaller (got {:.1} MB)", megabytes(.size))]
    TooLarge { size: u64 },
    #[error("Unsupported image type '{0}'. Allowed: {allowed}", allowed = allowed_labels())]
    UnsupportedType(String),
}

fn allowed_labels() -> String {
    ImageKind::ALL.map(ImageKind::label).join(", ")
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

/// A file picked by the user, as the browser describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub declared_type: String,
    pub declared_size: u64,
}

impl ImageAsset {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, declared_type: impl Into<String>) -> Self {
        let declared_size = bytes.len() as u64;
        Self {
            file_name: file_name.into(),
            bytes,
            declared_type: declared_type.into(),
            declared_size,
        }
    }

    /// Read a file from disk, declaring its type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let declared_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes, declared_type))
    }
}

/// An asset whose declared size and type are within policy.
///
/// Only [`validate`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAsset {
    asset: ImageAsset,
    kind: ImageKind,
}

impl ValidatedAsset {
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.asset.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.asset.bytes
    }

    pub fn len(&self) -> usize {
        self.asset.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asset.bytes.is_empty()
    }
}

/// Outcome of [`check`], in the `{valid, error}` shape UI code displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub error: Option<String>,
}

/// Accept or reject an asset by declared size and type.
pub fn validate(asset: ImageAsset) -> Result<ValidatedAsset, ValidationError> {
    if asset.declared_size == 0 {
        return Err(ValidationError::Empty);
    }
    if asset.declared_size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: asset.declared_size,
        });
    }
    let kind = ImageKind::from_mime(&asset.declared_type)
        .ok_or_else(|| ValidationError::UnsupportedType(asset.declared_type.clone()))?;
    Ok(ValidatedAsset { asset, kind })
}

/// Non-consuming form of [`validate`].
pub fn check(asset: &ImageAsset) -> Validation {
    match validate(asset.clone()) {
        Ok(_) => Validation {
            valid: true,
            error: None,
        },
        Err(e) => Validation {
            valid: false,
            error: Some(e.to_string()),
        },
    }
}
