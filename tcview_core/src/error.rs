//! Error taxonomy for the TCView engine.
//!
//! Everything except [`ViewError::Internal`] is a recoverable, user-facing
//! failure. `Internal` means the actor registry no longer agrees with the
//! active-tag set; callers must not retry or swallow it.

use crate::model::{EntityClass, Tag};
use std::path::PathBuf;
use tcview_env::GatewayError;
use thiserror::Error;

/// A broken registry invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An active tag's slot was empty after placement
    #[error("{class} slot {tag} is empty after placement")]
    EmptySlot { class: EntityClass, tag: Tag },

    /// A bond named an endpoint with no live actor
    #[error("bond #{bond_index} references empty {class} slot {tag}")]
    BondEndpointMissing {
        bond_index: usize,
        class: EntityClass,
        tag: Tag,
    },
}

/// Errors produced by the reconciliation engine and playback controller.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Position file could not be opened; playback did not start
    #[error("Failed to open position stream {path:?}: {source}")]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an open stream failed
    #[error("Stream read error: {0}")]
    StreamRead(#[from] std::io::Error),

    /// A record line could not be parsed; the rest of its frame was skipped
    #[error("Malformed record on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A packed live-simulation buffer was malformed
    #[error("Malformed packed record #{index}: {reason}")]
    Packed { index: usize, reason: String },

    /// Tag exceeds the configured registry bound
    #[error("{class} tag {tag} exceeds configured maximum {max}")]
    TagOutOfRange {
        class: EntityClass,
        tag: Tag,
        max: Tag,
    },

    /// The render gateway rejected a call
    #[error("Render gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry out of sync with the active-tag set
    #[error("Internal invariant violation: {0}")]
    Internal(#[from] InvariantViolation),
}

impl ViewError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for internal-consistency failures that must abort.
    pub fn is_internal(&self) -> bool {
        matches!(self, ViewError::Internal(_))
    }
}
