//! Error types for VastuReloc

use thiserror::Error;

/// Recoverable errors surfaced by artifact I/O and the persistence collaborator.
///
/// None of these are fatal to reconciliation: the engine records the message
/// and keeps its in-memory state untouched.
#[derive(Error, Debug)]
pub enum RelocError {
    /// Underlying file or stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed artifact or frame-log JSON.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Artifact written by an incompatible format version.
    #[error("Unsupported artifact version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the artifact
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// Mesh and room artifacts describe different maps.
    #[error("Artifact is for map '{found}', expected '{expected}'")]
    MapMismatch {
        /// Map name in the offending artifact
        found: String,
        /// Map name of the loaded map
        expected: String,
    },

    /// Failure reported by the external persistence collaborator.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result alias for artifact and persistence operations.
pub type Result<T> = std::result::Result<T, RelocError>;
