//! Creators and contributors from `dcx-dai` author details

use crate::xml::{XmlElement, NS_DCX_DAI};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub affiliation: Option<String>,
    pub identifier_scheme: Option<&'static str>,
    pub identifier: Option<String>,
    pub role: Option<String>,
    pub is_organization: bool,
}

impl Author {
    /// `<dcx-dai:author>`; `None` when no name part is present
    pub fn from_dai_author(element: &XmlElement) -> Option<Self> {
        let part = |name: &str| element.child_text(NS_DCX_DAI, name);

        let name = [part("initials"), part("insertions"), part("surname")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let organization = element
            .child(NS_DCX_DAI, "organization")
            .and_then(|o| o.child_text(NS_DCX_DAI, "name"))
            .map(str::to_string);

        if name.is_empty() {
            return organization.map(Self::organization);
        }

        let (identifier_scheme, identifier) = identifier(element)
            .map(|(scheme, value)| (Some(scheme), Some(value)))
            .unwrap_or((None, None));

        Some(Self {
            name,
            affiliation: organization,
            identifier_scheme,
            identifier,
            role: part("role").map(str::to_string),
            is_organization: false,
        })
    }

    /// `<dcx-dai:organization>`
    pub fn from_dai_organization(element: &XmlElement) -> Option<Self> {
        element
            .child_text(NS_DCX_DAI, "name")
            .map(|name| Self::organization(name.to_string()))
    }

    /// Free-text creator such as `<dc:creator>`
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self {
            name: name.to_string(),
            affiliation: None,
            identifier_scheme: None,
            identifier: None,
            role: None,
            is_organization: false,
        })
    }

    fn organization(name: String) -> Self {
        Self {
            name,
            affiliation: None,
            identifier_scheme: None,
            identifier: None,
            role: None,
            is_organization: true,
        }
    }
}

/// First identifier in priority order ORCID, ISNI, DAI
fn identifier(element: &XmlElement) -> Option<(&'static str, String)> {
    if let Some(orcid) = element.child_text(NS_DCX_DAI, "ORCID") {
        return Some(("ORCID", last_segment(orcid).to_string()));
    }
    if let Some(isni) = element.child_text(NS_DCX_DAI, "ISNI") {
        return Some(("ISNI", last_segment(isni).replace(' ', "")));
    }
    element
        .child_text(NS_DCX_DAI, "DAI")
        .map(|dai| ("DAI", last_segment(dai).to_string()))
}

fn last_segment(value: &str) -> &str {
    value.trim_end_matches('/').rsplit('/').next().unwrap_or(value)
}
