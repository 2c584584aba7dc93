//! Error type for detection parsing and detector I/O.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    /// A hand did not carry the full 21-point skeleton.
    #[error("expected 21 landmarks, got {0}")]
    LandmarkCount(usize),

    /// A detector line was not valid detection JSON.
    #[error("malformed detection line: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("detector I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The detector subprocess printed something other than `READY` first.
    #[error("detector did not signal ready, got {0:?}")]
    NotReady(String),

    #[error("unknown mode {0:?} (expected tree, scatter, focus or gallery)")]
    UnknownMode(String),
}
