//! In-memory model of a BagIt bag
//!
//! [`Bag::read`] loads `bagit.txt`, `bag-info.txt` and every payload and tag
//! manifest. Enrichment only mutates tag manifests; payload manifests and
//! `bag-info.txt` are never written back.

pub mod manifest;

pub use manifest::{relative_path, Manifest, ManifestKind};

use crate::error::{IngestError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use vault_common::checksum::{verify_file_checksum, ChecksumAlgorithm};
use vault_common::VaultError;
use walkdir::WalkDir;

pub const BAGIT_TXT: &str = "bagit.txt";
pub const BAG_INFO_TXT: &str = "bag-info.txt";
pub const PAYLOAD_DIR: &str = "data";

/// bag-info.txt key marking a deposit as a new version of an existing dataset
pub const IS_VERSION_OF: &str = "Is-Version-Of";

#[derive(Debug, Clone)]
pub struct Bag {
    root: PathBuf,
    version: String,
    encoding: String,
    info: Vec<(String, String)>,
    payload_manifests: BTreeMap<ChecksumAlgorithm, Manifest>,
    tag_manifests: BTreeMap<ChecksumAlgorithm, Manifest>,
}

impl Bag {
    pub fn read(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        let bagit_file = root.join(BAGIT_TXT);
        if !bagit_file.is_file() {
            return Err(IngestError::invalid_deposit(format!(
                "No {} found in {}",
                BAGIT_TXT,
                root.display()
            )));
        }
        let declaration = parse_tag_file(&std::fs::read_to_string(&bagit_file)?);
        let version = lookup(&declaration, "BagIt-Version").unwrap_or_default().to_string();
        let encoding = lookup(&declaration, "Tag-File-Character-Encoding")
            .unwrap_or("UTF-8")
            .to_string();

        let info_file = root.join(BAG_INFO_TXT);
        let info = if info_file.is_file() {
            parse_tag_file(&std::fs::read_to_string(&info_file)?)
        } else {
            Vec::new()
        };

        let mut payload_manifests = BTreeMap::new();
        let mut tag_manifests = BTreeMap::new();
        for entry in std::fs::read_dir(&root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(algorithm) = ManifestKind::Tag.algorithm_of(&name) {
                let algorithm = algorithm?;
                tag_manifests.insert(algorithm, Manifest::read(&root, ManifestKind::Tag, algorithm)?);
            } else if let Some(algorithm) = ManifestKind::Payload.algorithm_of(&name) {
                let algorithm = algorithm?;
                payload_manifests
                    .insert(algorithm, Manifest::read(&root, ManifestKind::Payload, algorithm)?);
            }
        }

        if payload_manifests.is_empty() {
            return Err(IngestError::invalid_deposit(format!(
                "Bag {} has no payload manifest",
                root.display()
            )));
        }

        Ok(Self {
            root,
            version,
            encoding,
            info,
            payload_manifests,
            tag_manifests,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name of the bag
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn info(&self) -> &[(String, String)] {
        &self.info
    }

    pub fn info_values(&self, key: &str) -> Vec<&str> {
        self.info
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn info_value(&self, key: &str) -> Option<&str> {
        lookup(&self.info, key)
    }

    /// Value of `Is-Version-Of`, present only for updates of an existing dataset
    pub fn is_version_of(&self) -> Option<&str> {
        self.info_value(IS_VERSION_OF).filter(|v| !v.trim().is_empty())
    }

    pub fn payload_algorithms(&self) -> Vec<ChecksumAlgorithm> {
        self.payload_manifests.keys().copied().collect()
    }

    pub fn tag_manifest_algorithms(&self) -> Vec<ChecksumAlgorithm> {
        self.tag_manifests.keys().copied().collect()
    }

    pub fn payload_manifest(&self, algorithm: ChecksumAlgorithm) -> Option<&Manifest> {
        self.payload_manifests.get(&algorithm)
    }

    pub fn tag_manifest(&self, algorithm: ChecksumAlgorithm) -> Option<&Manifest> {
        self.tag_manifests.get(&algorithm)
    }

    pub fn tag_manifest_mut(&mut self, algorithm: ChecksumAlgorithm) -> Option<&mut Manifest> {
        self.tag_manifests.get_mut(&algorithm)
    }

    /// Rewrite every `tagmanifest-<alg>.txt` from the in-memory manifests
    pub fn write_tag_manifests(&self) -> Result<()> {
        for manifest in self.tag_manifests.values() {
            manifest.write(&self.root, ManifestKind::Tag)?;
        }
        Ok(())
    }

    /// Absolute paths of all files below `data/`, sorted
    pub fn payload_files(&self) -> Result<Vec<PathBuf>> {
        let data = self.root.join(PAYLOAD_DIR);
        if !data.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&data).sort_by_file_name() {
            let entry = entry.map_err(|e| IngestError::Io(e.into()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Absolute paths of all tag files that tag manifests are expected to cover
    fn tag_files(&self) -> Result<Vec<PathBuf>> {
        let data = self.root.join(PAYLOAD_DIR);
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| IngestError::Io(e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.starts_with(&data) {
                continue;
            }
            let is_tag_manifest = entry.depth() == 1
                && ManifestKind::Tag
                    .algorithm_of(&entry.file_name().to_string_lossy())
                    .is_some();
            if !is_tag_manifest {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Recompute every digest from disk and report all inconsistencies
    ///
    /// An empty list means the bag is structurally valid.
    pub fn verify(&self) -> Result<Vec<String>> {
        let mut problems = Vec::new();

        if !self.tag_manifests.is_empty() {
            let payload: BTreeSet<_> = self.payload_manifests.keys().collect();
            let tag: BTreeSet<_> = self.tag_manifests.keys().collect();
            if payload != tag {
                problems.push(format!(
                    "Payload manifest algorithms {:?} differ from tag manifest algorithms {:?}",
                    payload, tag
                ));
            }
        }

        let payload_files = self.payload_files()?;
        for manifest in self.payload_manifests.values() {
            self.check_manifest(manifest, ManifestKind::Payload, &payload_files, &mut problems)?;
        }

        let tag_files = self.tag_files()?;
        for manifest in self.tag_manifests.values() {
            self.check_manifest(manifest, ManifestKind::Tag, &tag_files, &mut problems)?;
        }

        Ok(problems)
    }

    fn check_manifest(
        &self,
        manifest: &Manifest,
        kind: ManifestKind,
        expected_files: &[PathBuf],
        problems: &mut Vec<String>,
    ) -> Result<()> {
        let algorithm = manifest.algorithm();
        let manifest_name = kind.file_name(algorithm);

        for file in expected_files {
            if !manifest.contains(file) {
                problems.push(format!(
                    "{} does not list {}",
                    manifest_name,
                    relative_path(&self.root, file)?
                ));
            }
        }

        for (path, expected) in manifest.entries() {
            let relative = relative_path(&self.root, path)?;
            if !path.is_file() {
                problems.push(format!("{} lists missing file {}", manifest_name, relative));
                continue;
            }
            match verify_file_checksum(path, expected, algorithm) {
                Ok(()) => {},
                Err(VaultError::ChecksumMismatch { actual, .. }) => problems.push(format!(
                    "{} digest mismatch for {}: expected {}, found {}",
                    manifest_name, relative, expected, actual
                )),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// `Label: value` lines with indented continuation lines, duplicates kept
fn parse_tag_file(content: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = entries.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    entries
}

fn lookup<'a>(entries: &'a [(String, String)], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}
