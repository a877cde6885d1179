//! Error types shared by the vault crates

use thiserror::Error;

/// Result type alias for shared vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
