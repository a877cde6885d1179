//! Service configuration
//!
//! Loaded from a single YAML file. Optional settings fall back to the
//! `DEFAULT_*` constants below.

use crate::deposit::DepositKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_BACKLOG: usize = 64;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Validation of large bags can take minutes
pub const DEFAULT_VALIDATOR_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DATASTATION: &str = "VaaS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub inbox: PathBuf,
    pub outbox: PathBuf,
    pub dve_outbox: PathBuf,

    /// Create missing outbox directories at startup instead of failing
    #[serde(default = "default_true")]
    pub create_outbox_if_missing: bool,

    /// Process migration deposits instead of regular deposits
    #[serde(default)]
    pub migration: bool,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    #[serde(default)]
    pub task_queue: TaskQueueConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    pub validator: ValidatorConfig,
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub languages: LanguagesConfig,

    #[serde(default)]
    pub spatial_coverage_country_terms_path: Option<PathBuf>,

    /// depositor.userId to data supplier name
    #[serde(default)]
    pub data_suppliers: HashMap<String, String>,
}

/// What `submit` does when the task backlog is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WhenFull {
    #[default]
    Block,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueueConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_backlog")]
    pub backlog: usize,
    #[serde(default)]
    pub when_full: WhenFull,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            backlog: DEFAULT_BACKLOG,
            when_full: WhenFull::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_validator_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    pub url: String,
    /// Value recorded as `datastation` on catalog records created by this service
    #[serde(default = "default_datastation")]
    pub datastation: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguagesConfig {
    #[serde(rename = "iso6391", default)]
    pub iso639_1: Option<PathBuf>,
    #[serde(rename = "iso6392", default)]
    pub iso639_2: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_backlog() -> usize {
    DEFAULT_BACKLOG
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_validator_timeout() -> u64 {
    DEFAULT_VALIDATOR_TIMEOUT_SECS
}

fn default_catalog_timeout() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_SECS
}

fn default_datastation() -> String {
    DEFAULT_DATASTATION.to_string()
}

impl Config {
    /// Read and validate a YAML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.task_queue.workers == 0 {
            anyhow::bail!("taskQueue.workers must be greater than 0");
        }

        if self.task_queue.backlog == 0 {
            anyhow::bail!("taskQueue.backlog must be greater than 0");
        }

        if self.watcher.poll_interval_ms == 0 {
            anyhow::bail!("watcher.pollIntervalMs must be greater than 0");
        }

        if self.validator.url.trim().is_empty() {
            anyhow::bail!("validator.url cannot be empty");
        }

        if self.catalog.url.trim().is_empty() {
            anyhow::bail!("catalog.url cannot be empty");
        }

        if self.catalog.datastation.trim().is_empty() {
            anyhow::bail!("catalog.datastation cannot be empty");
        }

        if self.inbox == self.outbox {
            anyhow::bail!(
                "inbox and outbox must be different directories, both are {}",
                self.inbox.display()
            );
        }

        if self.data_suppliers.is_empty() {
            tracing::warn!("No data suppliers configured - vault metadata will lack a data supplier");
        }

        Ok(())
    }

    pub fn deposit_kind(&self) -> DepositKind {
        if self.migration {
            DepositKind::Migration
        } else {
            DepositKind::Standard
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
