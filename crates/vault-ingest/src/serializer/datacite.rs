//! DataCite kernel-4 XML

use crate::error::Result;
use crate::mapping::DataciteResource;
use crate::serializer::XmlOutput;

pub const KERNEL_4_NAMESPACE: &str = "http://datacite.org/schema/kernel-4";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://datacite.org/schema/kernel-4 http://schema.datacite.org/meta/kernel-4/metadata.xsd";

/// Write a list wrapper only when it has items
fn list<T>(
    out: &mut XmlOutput,
    wrapper: &str,
    items: &[T],
    mut item: impl FnMut(&mut XmlOutput, &T) -> Result<()>,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    out.start(wrapper, &[])?;
    for i in items {
        item(out, i)?;
    }
    out.end(wrapper)
}

pub fn to_xml(resource: &DataciteResource) -> Result<Vec<u8>> {
    let mut out = XmlOutput::new("datacite.xml")?;
    out.start(
        "resource",
        &[
            ("xmlns", KERNEL_4_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", SCHEMA_LOCATION),
        ],
    )?;

    out.text_element(
        "identifier",
        &[("identifierType", resource.identifier.identifier_type)],
        &resource.identifier.value,
    )?;

    list(&mut out, "creators", &resource.creators, |out, creator| {
        let name_type = if creator.is_organization { "Organizational" } else { "Personal" };
        out.start("creator", &[])?;
        out.text_element("creatorName", &[("nameType", name_type)], &creator.name)?;
        if let Some(id) = &creator.name_identifier {
            out.text_element("nameIdentifier", &[("nameIdentifierScheme", id.scheme)], &id.value)?;
        }
        if let Some(affiliation) = &creator.affiliation {
            out.text_element("affiliation", &[], affiliation)?;
        }
        out.end("creator")
    })?;

    list(&mut out, "titles", &resource.titles, |out, title| match title.title_type {
        Some(title_type) => out.text_element("title", &[("titleType", title_type)], &title.value),
        None => out.text_element("title", &[], &title.value),
    })?;

    out.text_element("publisher", &[], &resource.publisher)?;
    out.text_element("publicationYear", &[], &resource.publication_year)?;
    out.text_element(
        "resourceType",
        &[("resourceTypeGeneral", resource.resource_type.as_str())],
        &resource.resource_type,
    )?;

    list(&mut out, "subjects", &resource.subjects, |out, subject| {
        out.text_element("subject", &[], subject)
    })?;

    list(&mut out, "contributors", &resource.contributors, |out, contributor| {
        out.start("contributor", &[("contributorType", contributor.contributor_type)])?;
        out.text_element("contributorName", &[], &contributor.name)?;
        out.end("contributor")
    })?;

    list(&mut out, "dates", &resource.dates, |out, date| {
        out.text_element("date", &[("dateType", date.date_type)], &date.value)
    })?;

    if let Some(language) = &resource.language {
        out.text_element("language", &[], language)?;
    }

    list(&mut out, "alternateIdentifiers", &resource.alternate_identifiers, |out, id| {
        out.text_element(
            "alternateIdentifier",
            &[("alternateIdentifierType", id.identifier_type)],
            &id.value,
        )
    })?;

    list(&mut out, "rightsList", &resource.rights, |out, rights| {
        if rights.starts_with("http://") || rights.starts_with("https://") {
            out.text_element("rights", &[("rightsURI", rights.as_str())], rights)
        } else {
            out.text_element("rights", &[], rights)
        }
    })?;

    list(&mut out, "descriptions", &resource.descriptions, |out, description| {
        out.text_element("description", &[("descriptionType", "Abstract")], description)
    })?;

    out.end("resource")?;
    Ok(out.finish())
}
