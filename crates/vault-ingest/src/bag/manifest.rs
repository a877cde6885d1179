//! BagIt manifest files (`manifest-<alg>.txt`, `tagmanifest-<alg>.txt`)

use crate::error::{IngestError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vault_common::checksum::ChecksumAlgorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Payload,
    Tag,
}

impl ManifestKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ManifestKind::Payload => "manifest-",
            ManifestKind::Tag => "tagmanifest-",
        }
    }

    pub fn file_name(self, algorithm: ChecksumAlgorithm) -> String {
        format!("{}{}.txt", self.prefix(), algorithm.bagit_name())
    }

    /// Algorithm encoded in a manifest file name of this kind
    pub fn algorithm_of(self, file_name: &str) -> Option<Result<ChecksumAlgorithm>> {
        let name = file_name.strip_prefix(self.prefix())?.strip_suffix(".txt")?;
        Some(name.parse().map_err(|_| {
            IngestError::invalid_deposit(format!(
                "Bag uses unsupported checksum algorithm '{}' in {}",
                name, file_name
            ))
        }))
    }
}

/// Digests of one algorithm keyed by absolute file path, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    algorithm: ChecksumAlgorithm,
    entries: Vec<(PathBuf, String)>,
    /// Position of each path in `entries`
    index: HashMap<PathBuf, usize>,
}

impl Manifest {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self {
            algorithm,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn read(bag_root: &Path, kind: ManifestKind, algorithm: ChecksumAlgorithm) -> Result<Self> {
        let file = bag_root.join(kind.file_name(algorithm));
        let content = std::fs::read_to_string(&file)?;
        Self::parse(bag_root, algorithm, &content)
    }

    pub fn parse(bag_root: &Path, algorithm: ChecksumAlgorithm, content: &str) -> Result<Self> {
        let mut manifest = Self::new(algorithm);
        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (digest, path) = line
                .split_once(char::is_whitespace)
                .map(|(d, p)| (d, p.trim_start()))
                .filter(|(_, p)| !p.is_empty())
                .ok_or_else(|| {
                    IngestError::invalid_deposit(format!(
                        "Malformed line {} in {} manifest: '{}'",
                        number + 1,
                        algorithm,
                        line
                    ))
                })?;
            manifest.upsert(bag_root.join(decode_path(path)), digest.to_lowercase());
        }
        Ok(manifest)
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn entries(&self) -> &[(PathBuf, String)] {
        &self.entries
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.index.get(path).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Replace the digest for `path`, or append a new entry
    pub fn upsert(&mut self, path: PathBuf, digest: String) {
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = digest,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, digest));
            },
        }
    }

    /// Manifest file content with paths relative to `bag_root`
    pub fn to_text(&self, bag_root: &Path) -> Result<String> {
        let mut out = String::new();
        for (path, digest) in &self.entries {
            let relative = relative_path(bag_root, path)?;
            out.push_str(digest);
            out.push_str("  ");
            out.push_str(&encode_path(&relative));
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write(&self, bag_root: &Path, kind: ManifestKind) -> Result<()> {
        let text = self.to_text(bag_root)?;
        std::fs::write(bag_root.join(kind.file_name(self.algorithm)), text)?;
        Ok(())
    }
}

/// Slash-separated path of `path` relative to `base`
pub fn relative_path(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        IngestError::invalid_deposit(format!(
            "Path {} is outside of bag {}",
            path.display(),
            base.display()
        ))
    })?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn encode_path(path: &str) -> String {
    path.replace('%', "%25").replace('\n', "%0A").replace('\r', "%0D")
}

fn decode_path(path: &str) -> String {
    path.replace("%0A", "\n")
        .replace("%0a", "\n")
        .replace("%0D", "\r")
        .replace("%0d", "\r")
        .replace("%25", "%")
}
