//! Error taxonomy for the client.
//!
//! Every failure the client can observe maps to one [`ErrorKind`]. Only the
//! dispatcher decides what the user sees; see [`ApiError::user_message`].

use crate::imaging::ValidationError;
use crate::normalize::{FailureShape, normalize};
use thiserror::Error;

/// Failure of the transport itself: the server was never reached, or the
/// exchange broke off before a status arrived.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0}")]
    Unreachable(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Network(#[from] TransportError),
    #[error("{message}")]
    SessionExpired { message: String },
    /// The refresh endpoint did not yield an access token. The interceptor
    /// escalates this to [`ApiError::SessionExpired`].
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A `success: false` envelope or a non-auth error status. `message` is
    /// already normalized.
    #[error("{message}")]
    Business { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// The failure taxonomy callers reason about.
///
/// `TokenRefreshable` is how the session interceptor classifies a first 403.
/// It is resolved by a refresh and never carried by an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    SessionExpired,
    TokenRefreshable,
    RefreshFailed,
    ValidationFailure,
    BusinessFailure,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::NetworkFailure,
            ApiError::SessionExpired { .. } => ErrorKind::SessionExpired,
            ApiError::RefreshFailed(_) => ErrorKind::RefreshFailed,
            ApiError::Validation(_) => ErrorKind::ValidationFailure,
            // Undecodable bodies and rejected descriptors surface like any
            // other failed business call.
            ApiError::Business { .. }
            | ApiError::MalformedResponse(_)
            | ApiError::InvalidRequest(_) => ErrorKind::BusinessFailure,
        }
    }

    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Business { message, .. } | ApiError::SessionExpired { message } => {
                message.clone()
            }
            ApiError::Network(err) => normalize(&FailureShape::from_error(err)),
            other => normalize(&FailureShape::from_error(other)),
        }
    }

    /// Whether the session interceptor already told the user about this failure.
    pub fn already_surfaced(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }
}
