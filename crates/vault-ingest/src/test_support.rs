//! Deposit fixtures shared by unit tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::bag::test_support::write_bag;
use std::path::{Path, PathBuf};
use vault_common::checksum::ChecksumAlgorithm;

pub const DEPOSIT_ID: &str = "0b9bb5ee-3187-4387-bb39-2c09536c79f7";
pub const BAG_ID: &str = "urn:uuid:7E2C63B6-0A35-4C4B-8B6F-4C1B2B9D5A11";
pub const CREATED: &str = "2023-08-16T10:40:31.000+02:00";

pub const DATASET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ddm:DDM xmlns:ddm="http://schemas.dans.knaw.nl/dataset/ddm-v2/"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:dcx-dai="http://easy.dans.knaw.nl/schemas/dcx/dai/"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xmlns:id-type="http://easy.dans.knaw.nl/schemas/vocab/identifier-type/">
  <ddm:profile>
    <dc:title>Excavation at Het Hout</dc:title>
    <dc:description>Finds from the 2019 campaign.</dc:description>
    <dcx-dai:creatorDetails>
      <dcx-dai:author>
        <dcx-dai:titles>Dr</dcx-dai:titles>
        <dcx-dai:initials>J.A.</dcx-dai:initials>
        <dcx-dai:insertions>van</dcx-dai:insertions>
        <dcx-dai:surname>Dam</dcx-dai:surname>
        <dcx-dai:ORCID>https://orcid.org/0000-0001-2345-6789</dcx-dai:ORCID>
        <dcx-dai:DAI>info:eu-repo/dai/nl/123456789</dcx-dai:DAI>
        <dcx-dai:organization>
          <dcx-dai:name>Leiden University</dcx-dai:name>
        </dcx-dai:organization>
      </dcx-dai:author>
    </dcx-dai:creatorDetails>
    <ddm:created>2019-06-01</ddm:created>
    <ddm:available>2020-01-15</ddm:available>
    <ddm:accessRights>OPEN_ACCESS</ddm:accessRights>
    <ddm:audience>D37000</ddm:audience>
  </ddm:profile>
  <ddm:dcmiMetadata>
    <dcterms:identifier xsi:type="id-type:DOI">10.17026/dans-2xy-abcd</dcterms:identifier>
    <dcterms:identifier xsi:type="id-type:ISBN">978-90-6984-123-4</dcterms:identifier>
    <dcterms:identifier>LEI-2019-HH</dcterms:identifier>
    <ddm:description descriptionType="SeriesInformation">Leiden Archaeological Reports 12</ddm:description>
    <dcterms:alternative>Het Hout 2019</dcterms:alternative>
    <dc:subject>archaeology</dc:subject>
    <dc:language>nl</dc:language>
    <dcterms:publisher>DANS</dcterms:publisher>
    <dcterms:rightsHolder>Municipality of Leiden</dcterms:rightsHolder>
    <dcterms:license>http://creativecommons.org/licenses/by/4.0</dcterms:license>
    <dcterms:spatial>Netherlands</dcterms:spatial>
  </ddm:dcmiMetadata>
</ddm:DDM>
"#;

/// files.xml listing the given payload paths
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

pub fn default_properties() -> Vec<(&'static str, &'static str)> {
    vec![
        ("state.label", "SUBMITTED"),
        ("depositor.userId", "user001"),
        ("dataverse.bag-id", BAG_ID),
        ("dataverse.sword-token", "sword:0b9bb5ee-3187-4387-bb39-2c09536c79f7"),
        ("creation.timestamp", CREATED),
    ]
}

/// Write `<parent>/<DEPOSIT_ID>/bag` with two payload files and return the deposit directory
pub fn write_deposit(parent: &Path, info: &[(&str, &str)], properties: &[(&str, &str)]) -> PathBuf {
    let deposit_dir = parent.join(DEPOSIT_ID);
    let bag_dir = deposit_dir.join("bag");
    let payload = [("data/readme.txt", "hello"), ("data/finds/table 1.csv", "a,b\n1,2\n")];
    let files = files_xml(&payload.iter().map(|(p, _)| *p).collect::<Vec<_>>());
    write_bag(
        &bag_dir,
        info,
        &payload,
        &[("metadata/dataset.xml", DATASET_XML), ("metadata/files.xml", &files)],
        &[ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1],
    );

    let text: String = properties.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect();
    std::fs::write(deposit_dir.join("deposit.properties"), text).unwrap();
    deposit_dir
}
