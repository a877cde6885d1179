//! Byte-level renditions of the mapped metadata
//!
//! Every serializer is deterministic: equal inputs give equal bytes. The
//! enricher relies on that when a deposit is ingested a second time.

pub mod datacite;
pub mod json_ld;
pub mod rdf_xml;

use crate::error::{IngestError, Result};
use crate::mapping::MappedMetadata;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const DATACITE_XML: &str = "metadata/datacite.xml";
pub const OAI_ORE_RDF: &str = "metadata/oai-ore.rdf";
pub const OAI_ORE_JSONLD: &str = "metadata/oai-ore.jsonld";
pub const PID_MAPPING_TXT: &str = "metadata/pid-mapping.txt";

/// The four generated metadata files as `(path relative to the bag, bytes)`
pub fn serialize(metadata: &MappedMetadata) -> Result<Vec<(&'static str, Vec<u8>)>> {
    Ok(vec![
        (DATACITE_XML, datacite::to_xml(&metadata.datacite)?),
        (OAI_ORE_RDF, rdf_xml::to_rdf_xml(&metadata.ore)?),
        (OAI_ORE_JSONLD, json_ld::to_json_ld(&metadata.ore)?),
        (PID_MAPPING_TXT, metadata.pid_mapping.to_text().into_bytes()),
    ])
}

/// Indented XML output that tags every failure with the artifact being written
pub(crate) struct XmlOutput {
    writer: Writer<Vec<u8>>,
    artifact: &'static str,
}

impl XmlOutput {
    pub(crate) fn new(artifact: &'static str) -> Result<Self> {
        let mut output = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            artifact,
        };
        output.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(output)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        let artifact = self.artifact;
        self.writer
            .write_event(event)
            .map_err(|e| IngestError::serialization(artifact, e))
    }

    pub(crate) fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Start(start))
    }

    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Empty(start))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// `<name attrs>text</name>` on one line
    pub(crate) fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attributes)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        bytes
    }
}
