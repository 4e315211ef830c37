//! Error types for TetForge Core.

use thiserror::Error;

/// Result type alias for TetForge operations.
pub type Result<T> = std::result::Result<T, TetForgeError>;

/// Main error type for the TetForge plugin core.
#[derive(Debug, Error)]
pub enum TetForgeError {
    /// Input surface mesh failed validation.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// An operation is already running; starts are serialized.
    #[error("An operation is already in flight")]
    OperationInFlight,

    /// The operation was cancelled cooperatively.
    #[error("Operation cancelled")]
    Cancelled,

    /// Options document could not be parsed.
    #[error("Invalid options: {0}")]
    Options(#[from] serde_json::Error),

    /// Mesh export failed.
    #[error("Export error: {0}")]
    Export(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
