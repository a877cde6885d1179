//! In-place bag enrichment and archiving
//!
//! [`enrich`] adds the generated metadata files to a bag and brings the tag
//! manifests up to date. Payload manifests and `bag-info.txt` are left alone,
//! so the payload of an enriched bag is byte-identical to the deposited one.
//! [`zip_bag`] then packs the bag for the vault.

use crate::bag::{relative_path, Bag};
use crate::error::{IngestError, Result};
use crate::mapping::MappedMetadata;
use crate::serializer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vault_common::checksum::DigestWriter;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write the serialized metadata into the bag and update every tag manifest
///
/// Returns the relative paths that were written.
pub fn enrich(bag: &mut Bag, metadata: &MappedMetadata) -> Result<Vec<&'static str>> {
    let algorithms = bag.tag_manifest_algorithms();
    let files = serializer::serialize(metadata)?;
    let mut written = Vec::with_capacity(files.len());

    for (relative, bytes) in files {
        let target = bag.root().join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = DigestWriter::new(BufWriter::new(File::create(&target)?), algorithms.iter().copied());
        writer.write_all(&bytes)?;
        let (mut file, digests) = writer.finish()?;
        file.flush()?;

        for (algorithm, digest) in digests {
            if let Some(manifest) = bag.tag_manifest_mut(algorithm) {
                manifest.upsert(target.clone(), digest);
            }
        }
        debug!(file = relative, bytes = bytes.len(), "Wrote metadata file");
        written.push(relative);
    }

    bag.write_tag_manifests()?;
    info!(bag = %bag.root().display(), algorithms = ?algorithms, "Enriched bag");
    Ok(written)
}

/// `vaas-<id>-v<version>.zip`, `<id>` being the lowercased last colon-separated part of the bag id
pub fn zip_name(bag_id: &str, object_version: u32) -> String {
    let tail = bag_id.rsplit(':').next().unwrap_or(bag_id);
    format!("vaas-{}-v{}.zip", tail.to_lowercase(), object_version)
}

/// Deflate `bag_dir` into `target`, entries rooted at the bag's directory name
///
/// The archive is assembled next to `target` and renamed into place once complete.
pub fn zip_bag(bag_dir: &Path, target: &Path) -> Result<PathBuf> {
    let base = bag_dir.parent().unwrap_or(bag_dir);
    let partial = target.with_extension("zip.part");

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut zip = ZipWriter::new(BufWriter::new(File::create(&partial)?));
    let mut entries = 0usize;
    for entry in WalkDir::new(bag_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| IngestError::Io(e.into()))?;
        let name = relative_path(base, entry.path())?;

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            std::io::copy(&mut file, &mut zip)?;
        }
        entries += 1;
    }
    let mut out = zip.finish()?;
    out.flush()?;
    drop(out);

    std::fs::rename(&partial, target)?;
    info!(zip = %target.display(), entries, "Created bag archive");
    Ok(target.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::bag::test_support::write_bag;
    use crate::mapping::{DataciteResource, MappedMetadata, OreGraph, PidMapping};
    use crate::mapping::datacite::{Identifier, Title};
    use crate::rdf::{ns, Graph, Term};
    use std::io::Read;
    use vault_common::checksum::ChecksumAlgorithm;

    fn metadata() -> MappedMetadata {
        let mut graph = Graph::new();
        let map = Term::iri("urn:uuid:dep-1");
        let aggregation = Term::iri("urn:nbn:nl:ui:13-x");
        graph.add_type(&map, &format!("{}ResourceMap", ns::ORE));
        graph.add(&map, format!("{}describes", ns::ORE), aggregation.clone());
        graph.add_type(&aggregation, &format!("{}Aggregation", ns::ORE));
        MappedMetadata {
            datacite: DataciteResource {
                identifier: Identifier {
                    value: "urn:nbn:nl:ui:13-x".to_string(),
                    identifier_type: "URN",
                },
                creators: vec![],
                titles: vec![Title {
                    value: "T".to_string(),
                    title_type: None,
                }],
                publisher: "DANS".to_string(),
                publication_year: "2023".to_string(),
                resource_type: "Dataset".to_string(),
                subjects: vec![],
                contributors: vec![],
                dates: vec![],
                language: None,
                alternate_identifiers: vec![],
                rights: vec![],
                descriptions: vec![],
            },
            ore: OreGraph {
                graph,
                resource_map: map,
                aggregation,
            },
            pid_mapping: PidMapping::new("dep-1", &[]),
        }
    }

    fn bag(root: &Path) -> Bag {
        write_bag(
            root,
            &[("Bagging-Date", "2023-08-16")],
            &[("data/a.txt", "a"), ("data/sub/b.txt", "b")],
            &[("metadata/dataset.xml", "<x/>")],
            &[ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha256],
        );
        Bag::read(root).unwrap()
    }

    #[test]
    fn test_enrich_keeps_bag_valid() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bag");
        let mut bag = bag(&root);
        let payload_manifest = std::fs::read(root.join("manifest-md5.txt")).unwrap();
        let bag_info = std::fs::read(root.join("bag-info.txt")).unwrap();

        let written = enrich(&mut bag, &metadata()).unwrap();
        assert_eq!(written.len(), 4);

        let reread = Bag::read(&root).unwrap();
        assert_eq!(reread.verify().unwrap(), Vec::<String>::new());
        for algorithm in [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha256] {
            let manifest = reread.tag_manifest(algorithm).unwrap();
            assert!(manifest.contains(&root.join("metadata/oai-ore.jsonld")));
            assert!(manifest.contains(&root.join("metadata/pid-mapping.txt")));
        }
        assert_eq!(std::fs::read(root.join("manifest-md5.txt")).unwrap(), payload_manifest);
        assert_eq!(std::fs::read(root.join("bag-info.txt")).unwrap(), bag_info);
    }

    #[test]
    fn test_enrich_twice_gives_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bag");
        let mut bag = bag(&root);

        enrich(&mut bag, &metadata()).unwrap();
        let first = std::fs::read(root.join("tagmanifest-sha256.txt")).unwrap();
        let mut bag = Bag::read(&root).unwrap();
        enrich(&mut bag, &metadata()).unwrap();
        assert_eq!(std::fs::read(root.join("tagmanifest-sha256.txt")).unwrap(), first);
    }

    #[test]
    fn test_zip_name() {
        assert_eq!(zip_name("urn:uuid:7E2C63B6-AB", 1), "vaas-7e2c63b6-ab-v1.zip");
        assert_eq!(zip_name("NoColonHere", 3), "vaas-nocolonhere-v3.zip");
    }

    #[test]
    fn test_zip_entry_order_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bag");
        bag(&root);
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("vaas-x-v1.zip");

        zip_bag(&root, &target).unwrap();
        assert!(!out.path().join("vaas-x-v1.zip.part").exists());

        let mut archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names[0], "bag/");
        assert!(names.iter().all(|n| n.starts_with("bag/")));
        let data = names.iter().position(|n| n == "bag/data/").unwrap();
        assert_eq!(names[data + 1], "bag/data/a.txt");
        assert_eq!(names[data + 2], "bag/data/sub/");
        assert_eq!(names[data + 3], "bag/data/sub/b.txt");

        let mut content = String::new();
        archive.by_name("bag/data/sub/b.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "b");
    }

    #[test]
    fn test_zip_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bag");
        bag(&root);
        let first = dir.path().join("one.zip");
        let second = dir.path().join("two.zip");
        zip_bag(&root, &first).unwrap();
        zip_bag(&root, &second).unwrap();
        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }
}
