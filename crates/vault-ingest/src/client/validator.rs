//! Client for the external bag validation service
//!
//! The service receives a multipart request whose `command` field holds the
//! bag location and package type as JSON, and answers with a compliance
//! verdict plus the rules that were violated.

use crate::config::ValidatorConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PackageType {
    Deposit,
    Migration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCommand {
    pub bag_location: String,
    pub package_type: PackageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleViolation {
    pub rule: String,
    pub violation: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResult {
    #[serde(default)]
    pub profile_version: Option<String>,
    pub is_compliant: bool,
    #[serde(default)]
    pub rule_violations: Vec<RuleViolation>,
}

impl ValidateResult {
    /// Human readable summary for `state.description`
    pub fn violation_summary(&self) -> String {
        let version = self.profile_version.as_deref().unwrap_or("unknown");
        if self.rule_violations.is_empty() {
            return format!(
                "Bag was not valid according to Profile Version {}, but no violations were reported",
                version
            );
        }
        let lines: Vec<String> = self
            .rule_violations
            .iter()
            .map(|v| format!("- [{}] {}", v.rule, v.violation))
            .collect();
        format!(
            "Bag was not valid according to Profile Version {}. Violations:\n{}",
            version,
            lines.join("\n")
        )
    }
}

/// Validation of a bag directory by an external authority
#[async_trait]
pub trait BagValidator: Send + Sync {
    /// Ok when the bag is compliant; `InvalidDeposit` with the violation summary when not
    async fn validate(&self, bag_dir: &Path, package_type: PackageType) -> Result<()>;
}

pub struct ValidatorClient {
    client: Client,
    url: String,
}

impl ValidatorClient {
    pub fn new(config: &ValidatorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl BagValidator for ValidatorClient {
    async fn validate(&self, bag_dir: &Path, package_type: PackageType) -> Result<()> {
        let command = ValidateCommand {
            bag_location: bag_dir.display().to_string(),
            package_type,
        };
        let body = serde_json::to_string(&command)?;
        debug!(url = %self.url, command = %body, "Requesting bag validation");

        let part = Part::text(body).mime_str("application/json")?;
        let form = Form::new().part("command", part);

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(IngestError::validator(format!(
                "validation of {} returned {}: {}",
                bag_dir.display(),
                status,
                text
            )));
        }

        let result: ValidateResult = response.json().await?;
        if result.is_compliant {
            info!(bag = %bag_dir.display(), "Bag is compliant");
            Ok(())
        } else {
            Err(IngestError::invalid_deposit(result.violation_summary()))
        }
    }
}
