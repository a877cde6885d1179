//! Payload files as described by `metadata/files.xml`

use crate::deposit::original_filepaths::OriginalFilepaths;
use crate::xml::XmlDocument;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const ORIGINAL_METADATA_ZIP: &str = "original-metadata.zip";

const ANONYMOUS: &str = "ANONYMOUS";
const OPEN_ACCESS: &str = "OPEN_ACCESS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFile {
    /// Identifier used for the file's `urn:uuid:` IRI and in `pid-mapping.txt`
    pub id: Uuid,
    /// Path as listed in files.xml, starting with `data/`
    pub logical_path: String,
    pub physical_path: PathBuf,
    pub description: Option<String>,
    pub restricted: bool,
}

impl PayloadFile {
    /// Last path segment with characters that are not allowed in file names replaced
    pub fn file_name(&self) -> String {
        let raw = self.logical_path.rsplit('/').next().unwrap_or_default();
        sanitize_file_name(raw)
    }

    /// Directory below `data/` with disallowed characters replaced, if the file is not at top level
    pub fn directory_label(&self) -> Option<String> {
        let relative = self.logical_path.strip_prefix("data/").unwrap_or(&self.logical_path);
        relative
            .rsplit_once('/')
            .map(|(dir, _)| sanitize_directory_label(dir))
            .filter(|d| !d.is_empty())
    }

    fn was_sanitized(&self) -> bool {
        let relative = self.logical_path.strip_prefix("data/").unwrap_or(&self.logical_path);
        let (dir, name) = relative.rsplit_once('/').unwrap_or(("", relative));
        sanitize_file_name(name) != name || sanitize_directory_label(dir) != dir
    }
}

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if ":*?\"<>|;#".contains(c) { '_' } else { c })
        .collect()
}

pub fn sanitize_directory_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_-.\\/ ".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Deterministic file id, stable across re-ingests of the same deposit
pub fn file_id(deposit_id: &str, logical_path: &str) -> Uuid {
    let deposit_namespace = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("urn:uuid:{}", deposit_id).as_bytes());
    Uuid::new_v5(&deposit_namespace, logical_path.as_bytes())
}

/// Build the payload file list from files.xml in document order
///
/// `dataset_access_rights` is the `ddm:accessRights` value that applies to files
/// without their own `accessibleToRights`.
pub fn payload_files(
    deposit_id: &str,
    bag_dir: &Path,
    files_xml: &XmlDocument,
    original_filepaths: &OriginalFilepaths,
    dataset_access_rights: Option<&str>,
) -> Vec<PayloadFile> {
    let mut files = Vec::new();

    for node in files_xml.root.children_local("file") {
        let Some(logical_path) = node.attribute(None, "filepath").map(str::trim) else {
            continue;
        };
        let physical_path = bag_dir.join(original_filepaths.physical_path(logical_path));

        let restricted = if logical_path.rsplit('/').next() == Some(ORIGINAL_METADATA_ZIP) {
            false
        } else if let Some(rights) = node
            .children_local("accessibleToRights")
            .map(|e| e.trimmed_text())
            .find(|t| !t.is_empty())
        {
            rights != ANONYMOUS
        } else {
            dataset_access_rights.map(str::trim) != Some(OPEN_ACCESS)
        };

        let mut file = PayloadFile {
            id: file_id(deposit_id, logical_path),
            logical_path: logical_path.to_string(),
            physical_path,
            description: None,
            restricted,
        };

        let mut description_parts: Vec<String> = node
            .children_local("description")
            .map(|e| e.trimmed_text().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if file.was_sanitized() {
            let original = logical_path.strip_prefix("data/").unwrap_or(logical_path);
            description_parts.push(format!("original_filepath: \"{}\"", original));
        }
        if !description_parts.is_empty() {
            file.description = Some(description_parts.join("; "));
        }

        files.push(file);
    }

    files
}
