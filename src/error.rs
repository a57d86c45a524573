//! Error taxonomy for the scanning pipeline.
//!
//! [`ConfigError`] aborts start-up and [`SourceError::Unreadable`] fails the
//! upload request. Every other kind is recovered where it happens: detection
//! failures skip a frame, auth failures fail the dispatch call, and delivery
//! failures are recorded on the recipient's outcome.

use std::io;

/// Invalid or missing settings, rejected before any frame is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sampling interval must be a positive integer, got {0}")]
    InvalidSamplingInterval(i64),

    #[error("at least one target class is required")]
    NoTargetClasses,

    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("failed to load service account key {path}: {reason}")]
    ServiceAccount { path: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("video source is unreadable: {0}")]
    Unreadable(String),

    #[error("failed to read frame {index}: {source}")]
    Read {
        index: u64,
        #[source]
        source: io::Error,
    },

    #[error("timed out reading frame {index}")]
    Timeout { index: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("failed to encode frame {index}: {reason}")]
    Encode { index: u64, reason: String },

    #[error("detector request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("detector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Credential acquisition failed; no recipient can be reached.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to sign service account assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("timed out waiting for the token endpoint")]
    Timeout,
}

/// One recipient could not be reached.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("push endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("push request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl TransportError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
            TransportError::Timeout(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("authorization failed: {0}")]
    AuthFailed(#[from] AuthError),
}

/// Request-level failure of the upload endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to store upload: {0}")]
    Storage(#[from] io::Error),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("invalid upload: {0}")]
    BadUpload(String),
}
