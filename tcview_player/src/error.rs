//! Error types for the player binary.

use tcview_core::ViewError;
use thiserror::Error;

/// Errors surfaced by `tcview` subcommands.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    Argument(String),
}

impl PlayerError {
    /// Process exit code: 2 for broken invariants, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            PlayerError::View(e) if e.is_internal() => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcview_core::{EntityClass, InvariantViolation};

    #[test]
    fn test_exit_codes() {
        let internal: PlayerError = ViewError::from(InvariantViolation::EmptySlot {
            class: EntityClass::TCell,
            tag: 4,
        })
        .into();
        assert_eq!(internal.exit_code(), 2);

        let parse: PlayerError = ViewError::Parse {
            line: 3,
            reason: "missing x".to_string(),
        }
        .into();
        assert_eq!(parse.exit_code(), 1);
        assert_eq!(PlayerError::Argument("bad".into()).exit_code(), 1);
    }
}
