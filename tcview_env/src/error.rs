//! Error types for the TCView render gateway.

use crate::gateway::ActorId;
use thiserror::Error;

/// Errors that can occur while talking to a render gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The handle does not name a live actor
    #[error("Unknown actor: {0}")]
    UnknownActor(ActorId),

    /// The backend has no pixel buffer to capture from
    #[error("Capture unsupported: {0}")]
    CaptureUnsupported(String),

    /// Captured frame does not match its declared dimensions
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Image encoder failed
    #[error("Image encoding error: {0}")]
    ImageEncoding(String),

    /// Backend-specific failure (viewer connection, stream closed, etc.)
    #[error("Backend error: {0}")]
    Backend(String),

    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<image::ImageError> for GatewayError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageEncoding(err.to_string())
    }
}
