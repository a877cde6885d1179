//! Shared fixtures for the ingest integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vault_common::checksum::{compute_file_digests, ChecksumAlgorithm};
use vault_ingest::bag::{Manifest, ManifestKind};
use vault_ingest::config::Config;
use vault_ingest::deposit::DepositProperties;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DEPOSIT_ID: &str = "2c2e0fa8-92f5-4c6e-9a55-4b3c0c7d1e11";
pub const BAG_ID: &str = "urn:uuid:4A9E1F2C-6B8D-4E1F-9C3A-2D5E7F8A9B0C";
pub const EXISTING_NBN: &str = "urn:nbn:nl:ui:13-existing-dataset";
pub const SUPPLIER: &str = "The Supplier";

pub const DATASET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ddm:DDM xmlns:ddm="http://schemas.dans.knaw.nl/dataset/ddm-v2/"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:dcx-dai="http://easy.dans.knaw.nl/schemas/dcx/dai/">
  <ddm:profile>
    <dc:title>Soil samples from the Veluwe</dc:title>
    <dc:description>Core samples taken in 2021.</dc:description>
    <dcx-dai:creatorDetails>
      <dcx-dai:author>
        <dcx-dai:initials>P.</dcx-dai:initials>
        <dcx-dai:surname>Jansen</dcx-dai:surname>
      </dcx-dai:author>
    </dcx-dai:creatorDetails>
    <ddm:created>2021-05-04</ddm:created>
    <ddm:available>2022-01-01</ddm:available>
    <ddm:accessRights>OPEN_ACCESS</ddm:accessRights>
  </ddm:profile>
  <ddm:dcmiMetadata>
    <dc:language>en</dc:language>
    <dcterms:license>http://creativecommons.org/publicdomain/zero/1.0</dcterms:license>
  </ddm:dcmiMetadata>
</ddm:DDM>
"#;

const PAYLOAD: [(&str, &str); 2] = [
    ("data/samples.csv", "id,depth\n1,20\n2,35\n"),
    ("data/photos/core 1.txt", "photo placeholder"),
];
const ALGORITHMS: [ChecksumAlgorithm; 2] = [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1];

/// Temporary inbox, outboxes and mock services for one test
pub struct Harness {
    pub dir: TempDir,
    pub validator: MockServer,
    pub catalog: MockServer,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inbox")).unwrap();
        Self {
            dir,
            validator: MockServer::start().await,
            catalog: MockServer::start().await,
        }
    }

    pub fn inbox(&self) -> PathBuf {
        self.dir.path().join("inbox")
    }

    pub fn outbox(&self, sub: &str) -> PathBuf {
        self.dir.path().join("outbox").join(sub)
    }

    pub fn dve_outbox(&self) -> PathBuf {
        self.dir.path().join("dve")
    }

    pub fn config(&self) -> Config {
        let yaml = format!(
            "inbox: {inbox}\noutbox: {outbox}\ndveOutbox: {dve}\nshutdownTimeoutSecs: 5\n\
             taskQueue:\n  workers: 2\n  backlog: 4\nwatcher:\n  pollIntervalMs: 50\n\
             validator:\n  url: {validator}/validate\n  timeoutSecs: 5\n\
             catalog:\n  url: {catalog}\n  timeoutSecs: 5\n\
             dataSuppliers:\n  user001: {supplier}\n",
            inbox = self.inbox().display(),
            outbox = self.dir.path().join("outbox").display(),
            dve = self.dve_outbox().display(),
            validator = self.validator.uri(),
            catalog = self.catalog.uri(),
            supplier = SUPPLIER,
        );
        Config::from_yaml(&yaml).unwrap()
    }

    pub async fn validator_accepts(&self) {
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "profileVersion": "1.0.0",
                "isCompliant": true,
                "ruleViolations": []
            })))
            .mount(&self.validator)
            .await;
    }

    pub async fn validator_rejects(&self, rule: &str, violation: &str) {
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "profileVersion": "1.0.0",
                "isCompliant": false,
                "ruleViolations": [{ "rule": rule, "violation": violation }]
            })))
            .mount(&self.validator)
            .await;
    }

    /// Write a deposit into the inbox and return its directory
    pub fn write_deposit(&self, bag_info: &[(&str, &str)], created: &str) -> PathBuf {
        write_deposit(&self.inbox(), DEPOSIT_ID, bag_info, created)
    }
}

/// Catalog record with one version export per entry of `versions`
pub fn dataset_json(supplier: &str, versions: &[u32], created: &str) -> serde_json::Value {
    let exports: Vec<_> = versions
        .iter()
        .map(|v| {
            json!({
                "bagId": format!("urn:uuid:previous-{}", v),
                "ocflObjectVersionNumber": v,
                "createdTimestamp": created,
                "skeletonRecord": false
            })
        })
        .collect();
    json!({
        "nbn": EXISTING_NBN,
        "datastation": "VaaS",
        "dataSupplier": supplier,
        "versionExports": exports
    })
}

pub fn files_xml(paths: &[&str]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <files xmlns=\"http://easy.dans.knaw.nl/schemas/bag/metadata/files/\">\n",
    );
    for path in paths {
        xml.push_str(&format!("  <file filepath=\"{}\"/>\n", path));
    }
    xml.push_str("</files>\n");
    xml
}

/// `<parent>/<id>/bag` with complete md5 and sha1 manifests, plus deposit.properties
///
/// Deposits other than [`DEPOSIT_ID`] get a bag id derived from `id`.
pub fn write_deposit(parent: &Path, id: &str, bag_info: &[(&str, &str)], created: &str) -> PathBuf {
    let deposit_dir = parent.join(id);
    let root = deposit_dir.join("bag");
    std::fs::create_dir_all(root.join("data")).unwrap();

    std::fs::write(
        root.join("bagit.txt"),
        "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n",
    )
    .unwrap();
    let info: String = bag_info.iter().map(|(k, v)| format!("{}: {}\n", k, v)).collect();
    std::fs::write(root.join("bag-info.txt"), info).unwrap();

    let files = files_xml(&PAYLOAD.iter().map(|(p, _)| *p).collect::<Vec<_>>());
    let metadata = [("metadata/dataset.xml", DATASET_XML), ("metadata/files.xml", files.as_str())];
    for (relative, content) in PAYLOAD.iter().chain(metadata.iter()) {
        let file = root.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    for algorithm in ALGORITHMS {
        let mut manifest = Manifest::new(algorithm);
        for (relative, _) in PAYLOAD {
            manifest.upsert(root.join(relative), digest(&root.join(relative), algorithm));
        }
        manifest.write(&root, ManifestKind::Payload).unwrap();
    }

    let mut tagged = vec!["bagit.txt".to_string(), "bag-info.txt".to_string()];
    tagged.extend(ALGORITHMS.iter().map(|a| ManifestKind::Payload.file_name(*a)));
    tagged.extend(metadata.iter().map(|(p, _)| p.to_string()));
    for algorithm in ALGORITHMS {
        let mut manifest = Manifest::new(algorithm);
        for relative in &tagged {
            manifest.upsert(root.join(relative), digest(&root.join(relative), algorithm));
        }
        manifest.write(&root, ManifestKind::Tag).unwrap();
    }

    let bag_id = if id == DEPOSIT_ID {
        BAG_ID.to_string()
    } else {
        format!("urn:uuid:{}", id)
    };
    let properties = format!(
        "state.label=SUBMITTED\nstate.description=Deposit is valid and ready for post-submission processing\n\
         depositor.userId=user001\ndataverse.bag-id={}\ndataverse.sword-token=sword:{}\ncreation.timestamp={}\n",
        bag_id, id, created
    );
    std::fs::write(deposit_dir.join("deposit.properties"), properties).unwrap();
    deposit_dir
}

fn digest(file: &Path, algorithm: ChecksumAlgorithm) -> String {
    compute_file_digests(file, [algorithm]).unwrap()[&algorithm].clone()
}

pub fn properties(deposit_dir: &Path) -> DepositProperties {
    DepositProperties::load(deposit_dir).unwrap()
}
