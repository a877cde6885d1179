//! HTTP clients for the services the ingest pipeline depends on

pub mod catalog;
pub mod validator;

pub use catalog::{CatalogClient, Dataset, VaultCatalog, VersionExport};
pub use validator::{BagValidator, PackageType, ValidatorClient};
