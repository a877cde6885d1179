//! The deposit aggregate
//!
//! A [`Deposit`] is everything one ingest task knows about one deposit
//! directory. It is created by the [`DepositLoader`], owned by exactly one
//! task and dropped when that task finishes.

pub mod files;
pub mod loader;
pub mod original_filepaths;
pub mod properties;

pub use files::PayloadFile;
pub use loader::{DepositKind, DepositLoader};
pub use original_filepaths::OriginalFilepaths;
pub use properties::{DepositProperties, DepositState};

use crate::bag::Bag;
use crate::xml::{XmlDocument, XmlElement};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Deposit {
    /// Name of the deposit directory
    pub id: String,
    pub dir: PathBuf,
    pub bag_dir: PathBuf,
    pub kind: DepositKind,
    pub dataset_xml: XmlDocument,
    pub files_xml: XmlDocument,
    pub properties: DepositProperties,
    pub bag: Bag,
    pub original_filepaths: OriginalFilepaths,
    pub payload_files: Vec<PayloadFile>,
    pub creation_timestamp: DateTime<FixedOffset>,
    /// Empty until assigned by catalog synchronization
    pub nbn: String,
    pub object_version: u32,
    /// Empty when the depositor has no configured data supplier
    pub data_supplier: String,
}

impl Deposit {
    /// `dataverse.bag-id` from the deposit properties
    pub fn bag_id(&self) -> Option<&str> {
        self.properties.bag_id()
    }

    pub fn is_update(&self) -> bool {
        self.bag.is_version_of().is_some()
    }

    pub fn is_version_of(&self) -> Option<&str> {
        self.bag.is_version_of()
    }

    pub fn depositor_id(&self) -> Option<&str> {
        self.properties.depositor_id()
    }

    pub fn sword_token(&self) -> Option<&str> {
        self.properties.sword_token()
    }

    /// The dataset DOI from dataset.xml, else from `identifier.doi`
    pub fn doi(&self) -> Option<String> {
        doi_identifiers(&self.dataset_xml)
            .into_iter()
            .next()
            .or_else(|| self.properties.doi().map(str::to_string))
    }
}

/// Text of every DOI-typed identifier in the dcmiMetadata section
pub fn doi_identifiers(dataset_xml: &XmlDocument) -> Vec<String> {
    ["ddm:dcmiMetadata/dcterms:identifier", "ddm:dcmiMetadata/dc:identifier"]
        .iter()
        .flat_map(|path| dataset_xml.root.select(path))
        .filter(|e| is_doi_type(e))
        .map(|e| e.trimmed_text().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_doi_type(element: &XmlElement) -> bool {
    element
        .xsi_type()
        .map(|t| t.rsplit(':').next() == Some("DOI"))
        .unwrap_or(false)
}
