//! Reads a deposit directory into a [`Deposit`]

use crate::bag::Bag;
use crate::client::validator::PackageType;
use crate::deposit::files::payload_files;
use crate::deposit::{doi_identifiers, Deposit, DepositProperties, OriginalFilepaths};
use crate::error::{IngestError, Result};
use crate::xml::XmlDocument;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DATASET_XML: &str = "metadata/dataset.xml";
pub const FILES_XML: &str = "metadata/files.xml";

/// Flavor of deposit handled by an ingest area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepositKind {
    #[default]
    Standard,
    /// Datasets migrated from a legacy archive; these must already carry a DOI
    Migration,
}

impl DepositKind {
    pub fn package_type(self) -> PackageType {
        match self {
            DepositKind::Standard => PackageType::Deposit,
            DepositKind::Migration => PackageType::Migration,
        }
    }

    fn check_required_fields(self, dataset_xml: &XmlDocument) -> Result<()> {
        let has_title = dataset_xml
            .root
            .select("ddm:profile/dc:title")
            .iter()
            .any(|t| !t.trimmed_text().is_empty());
        if !has_title {
            return Err(IngestError::invalid_deposit(
                "dataset.xml has no title (ddm:profile/dc:title)",
            ));
        }

        if self == DepositKind::Migration {
            let dois = doi_identifiers(dataset_xml);
            if dois.len() != 1 {
                return Err(IngestError::invalid_deposit(format!(
                    "Migration deposit must have exactly one DOI identifier in dataset.xml, found {}",
                    dois.len()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DepositLoader {
    kind: DepositKind,
}

impl DepositLoader {
    pub fn new(kind: DepositKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DepositKind {
        self.kind
    }

    /// The single subdirectory of a deposit directory
    pub fn find_bag_dir(deposit_dir: &Path) -> Result<PathBuf> {
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(deposit_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        match dirs.len() {
            1 => Ok(dirs.remove(0)),
            n => Err(IngestError::invalid_deposit(format!(
                "Not a valid deposit layout: {} must contain exactly one bag directory, found {}",
                deposit_dir.display(),
                n
            ))),
        }
    }

    pub fn load(&self, deposit_dir: &Path, data_suppliers: &HashMap<String, String>) -> Result<Deposit> {
        let id = deposit_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                IngestError::invalid_deposit(format!("Invalid deposit path {}", deposit_dir.display()))
            })?;
        let bag_dir = Self::find_bag_dir(deposit_dir)?;

        let dataset_xml = read_metadata(&bag_dir, DATASET_XML)?;
        let files_xml = read_metadata(&bag_dir, FILES_XML)?;
        self.kind.check_required_fields(&dataset_xml)?;

        let properties = DepositProperties::load(deposit_dir)?;
        let creation_timestamp = properties.creation_timestamp()?;
        let bag = Bag::read(&bag_dir)?;
        let original_filepaths = OriginalFilepaths::load(&bag_dir)?;

        let access_rights = dataset_xml
            .root
            .select("ddm:profile/ddm:accessRights")
            .first()
            .map(|e| e.trimmed_text().to_string());
        let files = payload_files(&id, &bag_dir, &files_xml, &original_filepaths, access_rights.as_deref());
        check_payload_coverage(&bag, &files)?;

        let data_supplier = match properties.depositor_id() {
            Some(user) => match data_suppliers.get(user) {
                Some(supplier) => supplier.clone(),
                None => {
                    warn!(depositor = %user, "No data supplier configured for depositor");
                    String::new()
                },
            },
            None => {
                warn!("Deposit has no depositor.userId; data supplier left empty");
                String::new()
            },
        };

        debug!(
            deposit_id = %id,
            bag = %bag_dir.display(),
            files = files.len(),
            update = bag.is_version_of().is_some(),
            "Loaded deposit"
        );

        Ok(Deposit {
            id,
            dir: deposit_dir.to_path_buf(),
            bag_dir,
            kind: self.kind,
            dataset_xml,
            files_xml,
            properties,
            bag,
            original_filepaths,
            payload_files: files,
            creation_timestamp,
            nbn: String::new(),
            object_version: 1,
            data_supplier,
        })
    }
}

fn read_metadata(bag_dir: &Path, relative: &str) -> Result<XmlDocument> {
    let path = bag_dir.join(relative);
    if !path.is_file() {
        return Err(IngestError::invalid_deposit(format!(
            "Bag {} has no {}",
            bag_dir.display(),
            relative
        )));
    }
    XmlDocument::from_file(&path).map_err(|e| IngestError::invalid_deposit(e.to_string()))
}

/// Every described file must exist and every payload file must be described
fn check_payload_coverage(bag: &Bag, files: &[crate::deposit::PayloadFile]) -> Result<()> {
    let described: BTreeSet<&Path> = files.iter().map(|f| f.physical_path.as_path()).collect();

    if let Some(missing) = files.iter().find(|f| !f.physical_path.is_file()) {
        return Err(IngestError::invalid_deposit(format!(
            "File {} listed in files.xml does not exist in the bag",
            missing.logical_path
        )));
    }

    let on_disk = bag.payload_files()?;
    if let Some(undescribed) = on_disk.iter().find(|p| !described.contains(p.as_path())) {
        return Err(IngestError::invalid_deposit(format!(
            "Payload file {} is not described in files.xml",
            undescribed.display()
        )));
    }
    Ok(())
}
