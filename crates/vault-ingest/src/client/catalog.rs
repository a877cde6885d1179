//! Client for the vault catalog
//!
//! The catalog records, per dataset NBN, every version export that was sent
//! to the vault. Ingest uses it to decide whether a deposit starts a new
//! dataset or adds a version to an existing one.

use crate::config::CatalogConfig;
use crate::deposit::Deposit;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionExport {
    pub bag_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_nbn: Option<String>,
    pub ocfl_object_version_number: u32,
    pub created_timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub skeleton_record: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub nbn: String,
    #[serde(default)]
    pub datastation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_supplier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sword_token: Option<String>,
    #[serde(default)]
    pub version_exports: Vec<VersionExport>,
}

impl Dataset {
    /// Most recent `createdTimestamp` among the version exports
    pub fn latest_created_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.version_exports.iter().map(|v| v.created_timestamp).max()
    }

    /// Version number for the next export of this dataset
    ///
    /// Recorded versions must be exactly 1..=n; the next one is n + 1.
    pub fn next_object_version(&self) -> Result<u32> {
        if self.version_exports.is_empty() {
            return Err(IngestError::invalid_deposit(format!(
                "Dataset {} in the vault catalog has no version exports",
                self.nbn
            )));
        }
        let mut versions: Vec<u32> = self
            .version_exports
            .iter()
            .map(|v| v.ocfl_object_version_number)
            .collect();
        versions.sort_unstable();

        let consecutive = versions
            .iter()
            .enumerate()
            .all(|(i, v)| u32::try_from(i + 1).map(|expected| expected == *v).unwrap_or(false));
        if !consecutive {
            return Err(IngestError::invalid_deposit(format!(
                "The OCFL object version sequence {:?} does not start with 1 or is not consecutive for dataset {}",
                versions, self.nbn
            )));
        }

        u32::try_from(versions.len() + 1)
            .map_err(|_| IngestError::catalog(format!("Too many versions for dataset {}", self.nbn)))
    }
}

/// Skeleton version export describing `deposit`
pub fn version_export_for(deposit: &Deposit, include_nbn: bool) -> Result<VersionExport> {
    let bag_id = deposit
        .bag_id()
        .ok_or_else(|| IngestError::invalid_deposit("Deposit has no bag id"))?;
    Ok(VersionExport {
        bag_id: bag_id.to_string(),
        dataset_nbn: include_nbn.then(|| deposit.nbn.clone()),
        ocfl_object_version_number: deposit.object_version,
        created_timestamp: deposit.creation_timestamp,
        skeleton_record: true,
    })
}

#[async_trait]
pub trait VaultCatalog: Send + Sync {
    async fn find_dataset(&self, sword_token: &str) -> Result<Option<Dataset>>;

    /// Register a new dataset with version 1 of `deposit`
    async fn create_dataset_for(&self, deposit: &Deposit) -> Result<()>;

    /// Record `deposit` as version `deposit.object_version` of dataset `deposit.nbn`
    async fn add_dataset_version_for(&self, deposit: &Deposit) -> Result<()>;
}

pub struct CatalogClient {
    client: Client,
    base_url: String,
    datastation: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            datastation: config.datastation.clone(),
        })
    }

    fn datasets_url(&self) -> String {
        format!("{}/datasets", self.base_url)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(IngestError::catalog(format!("{} returned {}: {}", action, status, body)))
    }
}

#[async_trait]
impl VaultCatalog for CatalogClient {
    async fn find_dataset(&self, sword_token: &str) -> Result<Option<Dataset>> {
        debug!(sword_token, "Looking up dataset in vault catalog");
        let response = self
            .client
            .get(self.datasets_url())
            .query(&[("swordToken", sword_token)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, "dataset lookup").await?;
        Ok(Some(response.json().await?))
    }

    async fn create_dataset_for(&self, deposit: &Deposit) -> Result<()> {
        let dataset = Dataset {
            nbn: deposit.nbn.clone(),
            datastation: self.datastation.clone(),
            data_supplier: deposit.data_supplier.clone(),
            sword_token: deposit.sword_token().map(str::to_string),
            version_exports: vec![version_export_for(deposit, true)?],
        };

        let url = format!("{}/{}", self.datasets_url(), dataset.nbn);
        let response = self.client.put(&url).json(&dataset).send().await?;
        Self::check(response, "dataset creation").await?;

        info!(nbn = %dataset.nbn, datastation = %dataset.datastation, "Created dataset in vault catalog");
        Ok(())
    }

    async fn add_dataset_version_for(&self, deposit: &Deposit) -> Result<()> {
        let version = version_export_for(deposit, false)?;

        let url = format!(
            "{}/{}/versions/{}",
            self.datasets_url(),
            deposit.nbn,
            version.ocfl_object_version_number
        );
        let response = self.client.put(&url).json(&version).send().await?;
        Self::check(response, "version registration").await?;

        info!(
            nbn = %deposit.nbn,
            version = version.ocfl_object_version_number,
            "Added version to dataset in vault catalog"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn export(version: u32, created: &str) -> VersionExport {
        VersionExport {
            bag_id: format!("urn:uuid:bag-{}", version),
            dataset_nbn: None,
            ocfl_object_version_number: version,
            created_timestamp: DateTime::parse_from_rfc3339(created).unwrap(),
            skeleton_record: false,
        }
    }

    fn dataset(versions: &[u32]) -> Dataset {
        Dataset {
            nbn: "urn:nbn:nl:ui:13-abc".to_string(),
            datastation: "VaaS".to_string(),
            data_supplier: String::new(),
            sword_token: None,
            version_exports: versions.iter().map(|v| export(*v, "2023-01-01T00:00:00Z")).collect(),
        }
    }

    #[test]
    fn test_next_object_version() {
        assert_eq!(dataset(&[1]).next_object_version().unwrap(), 2);
        assert_eq!(dataset(&[3, 1, 2]).next_object_version().unwrap(), 4);
    }

    #[test]
    fn test_non_consecutive_sequences_reject() {
        let cases: [&[u32]; 4] = [&[1, 3], &[2, 3], &[1, 1], &[0, 1]];
        for versions in cases {
            let err = dataset(versions).next_object_version().unwrap_err();
            assert!(err.is_rejection());
            let message = err.to_string();
            assert!(message.contains("consecutive"), "{}", message);
            assert!(message.contains("urn:nbn:nl:ui:13-abc"));
        }
        assert!(dataset(&[]).next_object_version().unwrap_err().is_rejection());
    }

    #[test]
    fn test_latest_created_timestamp() {
        let mut ds = dataset(&[]);
        ds.version_exports = vec![
            export(1, "2023-01-01T00:00:00Z"),
            export(2, "2023-06-01T12:00:00+02:00"),
        ];
        assert_eq!(
            ds.latest_created_timestamp().unwrap(),
            DateTime::parse_from_rfc3339("2023-06-01T10:00:00Z").unwrap()
        );
    }

    #[tokio::test]
    async fn test_find_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets"))
            .and(query_param("swordToken", "sword:known"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nbn": "urn:nbn:nl:ui:13-abc",
                "datastation": "VaaS",
                "dataSupplier": "The Supplier",
                "versionExports": [{
                    "bagId": "urn:uuid:1",
                    "ocflObjectVersionNumber": 1,
                    "createdTimestamp": "2023-01-01T00:00:00Z",
                    "skeletonRecord": true
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = CatalogClient::new(&CatalogConfig {
            url: format!("{}/", server.uri()),
            datastation: "VaaS".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 5,
        })
        .unwrap();

        let found = client.find_dataset("sword:known").await.unwrap().unwrap();
        assert_eq!(found.data_supplier, "The Supplier");
        assert_eq!(found.next_object_version().unwrap(), 2);

        assert!(client.find_dataset("sword:unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = CatalogClient::new(&CatalogConfig {
            url: server.uri(),
            datastation: "VaaS".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 5,
        })
        .unwrap();

        let err = client.find_dataset("t").await.unwrap_err();
        assert!(!err.is_rejection());
        assert!(err.to_string().contains("boom"));
    }
}
