//! Error types for the ingest pipeline
//!
//! Every error raised while processing a deposit ends up in one of two deposit
//! states: [`IngestError::InvalidDeposit`] rejects the deposit, anything else
//! marks it as failed. [`IngestError::Cancelled`] is the exception: the task
//! was stopped before it changed anything and the deposit stays in the inbox.

use crate::deposit::DepositState;
use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The deposit itself is unacceptable; resubmitting it unchanged will not help
    #[error("{0}")]
    InvalidDeposit(String),

    /// The validator service answered with something other than a verdict
    #[error("Validator service error: {0}")]
    Validator(String),

    /// The catalog service answered with an unexpected status or body
    #[error("Vault catalog error: {0}")]
    Catalog(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum error: {0}")]
    Checksum(#[from] vault_common::VaultError),

    #[error("Failed to parse XML in {path}: {message}")]
    Xml { path: String, message: String },

    #[error("Failed to serialize {artifact}: {message}")]
    Serialization { artifact: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Task was cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn invalid_deposit(msg: impl Into<String>) -> Self {
        Self::InvalidDeposit(msg.into())
    }

    pub fn validator(msg: impl Into<String>) -> Self {
        Self::Validator(msg.into())
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    pub fn xml(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn serialization(artifact: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Serialization {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error rejects the deposit rather than failing it
    pub fn is_rejection(&self) -> bool {
        matches!(self, IngestError::InvalidDeposit(_))
    }

    /// Deposit state recorded for a task that ended with this error
    pub fn deposit_state(&self) -> DepositState {
        if self.is_rejection() {
            DepositState::Rejected
        } else {
            DepositState::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_deposit_is_rejection() {
        let err = IngestError::invalid_deposit("bag has no data directory");
        assert!(err.is_rejection());
        assert_eq!(err.deposit_state(), DepositState::Rejected);
        assert_eq!(err.to_string(), "bag has no data directory");
    }

    #[test]
    fn test_transport_errors_fail_deposit() {
        let err = IngestError::catalog("503 Service Unavailable");
        assert!(!err.is_rejection());
        assert_eq!(err.deposit_state(), DepositState::Failed);

        let io = IngestError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(io.deposit_state(), DepositState::Failed);
    }
}
