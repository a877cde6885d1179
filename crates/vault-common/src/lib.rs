//! Vault Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the vault ingest workspace.
//!
//! - **Error Handling**: [`VaultError`] and the crate [`Result`] alias
//! - **Checksums**: BagIt digest algorithms and a multi-digest writer that
//!   hashes bytes while they are written
//! - **Logging**: tracing subscriber bootstrap driven by environment variables
//!
//! # Example
//!
//! ```no_run
//! use vault_common::checksum::{compute_file_digests, ChecksumAlgorithm};
//!
//! fn digests(path: &str) -> vault_common::Result<()> {
//!     let digests = compute_file_digests(path, [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1])?;
//!     for (algorithm, hex) in digests {
//!         tracing::info!(%algorithm, %hex, "digest");
//!     }
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{Result, VaultError};
