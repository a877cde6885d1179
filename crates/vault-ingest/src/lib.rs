//! Vault Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns deposits dropped in an inbox directory into enriched, zipped bags
//! ready for the vault.
//!
//! # Pipeline
//!
//! - **Watching**: [`inbox::InboxWatcher`] reports new deposit directories
//! - **Scheduling**: [`queue::TaskQueue`] runs ingest tasks on a bounded worker pool
//! - **Processing**: [`task::IngestTask`] validates the bag remotely, loads the
//!   deposit, registers it in the vault catalog, adds DataCite, OAI-ORE and PID
//!   mapping metadata to the bag and zips it
//! - **Bookkeeping**: [`outbox::Outbox`] receives every deposit afterwards, sorted
//!   by its final state
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vault_ingest::config::Config;
//! use vault_ingest::ingest_area::IngestArea;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Path::new("etc/config.yml"))?;
//!     let area = IngestArea::from_config(&config)?;
//!     area.start();
//!     tokio::signal::ctrl_c().await?;
//!     area.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod bag;
pub mod cli;
pub mod client;
pub mod config;
pub mod deposit;
pub mod enricher;
pub mod error;
pub mod id_minter;
pub mod inbox;
pub mod ingest_area;
pub mod mapping;
pub mod outbox;
pub mod queue;
pub mod rdf;
pub mod serializer;
pub mod task;
pub mod vocabulary;
pub mod xml;

#[cfg(test)]
mod test_support;

pub use cli::{Cli, Commands};
pub use error::{IngestError, Result};
