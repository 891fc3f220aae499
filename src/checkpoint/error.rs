//! Checkpoint error types.

use crate::core::StateError;
use thiserror::Error;

/// Errors raised while encoding, decoding or restoring a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to encode checkpoint as {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("Failed to decode {format} checkpoint: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The checkpoint names a state that does not fit the definition.
    #[error("Cannot restore checkpoint: {0}")]
    Restore(#[from] StateError),
}
