//! Which parts of dataset.xml feed which metadata field
//!
//! Paths are relative to the `ddm:DDM` root element. For a field with several
//! paths, values are collected path by path in table order, then in document
//! order within a path.

use crate::xml::{XmlDocument, XmlElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    AlternativeTitle,
    Description,
    Creator,
    CreatorOrganization,
    CreatorName,
    Contributor,
    Keyword,
    Language,
    ProductionDate,
    DistributionDate,
    Publisher,
    RightsHolder,
    License,
    Source,
    SpatialCoverage,
    Audience,
    Identifier,
    /// Typed descriptions; the `descriptionType` attribute tells them apart
    TypedDescription,
}

pub struct Rule {
    pub field: Field,
    pub paths: &'static [&'static str],
}

pub const DDM_RULES: &[Rule] = &[
    Rule {
        field: Field::Title,
        paths: &["ddm:profile/dc:title"],
    },
    Rule {
        field: Field::AlternativeTitle,
        paths: &[
            "ddm:dcmiMetadata/dcterms:title",
            "ddm:dcmiMetadata/dc:title",
            "ddm:dcmiMetadata/dcterms:alternative",
        ],
    },
    Rule {
        field: Field::Description,
        paths: &["ddm:profile/dc:description", "ddm:dcmiMetadata/dcterms:description"],
    },
    Rule {
        field: Field::Creator,
        paths: &["ddm:profile/dcx-dai:creatorDetails/dcx-dai:author"],
    },
    Rule {
        field: Field::CreatorOrganization,
        paths: &["ddm:profile/dcx-dai:creatorDetails/dcx-dai:organization"],
    },
    Rule {
        field: Field::CreatorName,
        paths: &["ddm:profile/dc:creator"],
    },
    Rule {
        field: Field::Contributor,
        paths: &["ddm:dcmiMetadata/dcx-dai:contributorDetails/dcx-dai:author"],
    },
    Rule {
        field: Field::Keyword,
        paths: &["ddm:dcmiMetadata/dc:subject", "ddm:dcmiMetadata/dcterms:subject"],
    },
    Rule {
        field: Field::Language,
        paths: &["ddm:dcmiMetadata/dc:language", "ddm:dcmiMetadata/dcterms:language"],
    },
    Rule {
        field: Field::ProductionDate,
        paths: &["ddm:profile/ddm:created"],
    },
    Rule {
        field: Field::DistributionDate,
        paths: &["ddm:profile/ddm:available"],
    },
    Rule {
        field: Field::Publisher,
        paths: &["ddm:dcmiMetadata/dcterms:publisher", "ddm:dcmiMetadata/dc:publisher"],
    },
    Rule {
        field: Field::RightsHolder,
        paths: &["ddm:dcmiMetadata/dcterms:rightsHolder"],
    },
    Rule {
        field: Field::License,
        paths: &["ddm:dcmiMetadata/dcterms:license"],
    },
    Rule {
        field: Field::Source,
        paths: &["ddm:dcmiMetadata/dc:source", "ddm:dcmiMetadata/dcterms:source"],
    },
    Rule {
        field: Field::SpatialCoverage,
        paths: &["ddm:dcmiMetadata/dcterms:spatial"],
    },
    Rule {
        field: Field::Audience,
        paths: &["ddm:profile/ddm:audience"],
    },
    Rule {
        field: Field::Identifier,
        paths: &[
            "ddm:dcmiMetadata/dcterms:identifier",
            "ddm:dcmiMetadata/dc:identifier",
            "ddm:dcmiMetadata/ddm:identifier",
        ],
    },
    Rule {
        field: Field::TypedDescription,
        paths: &["ddm:dcmiMetadata/ddm:description"],
    },
];

/// Applies a rule table to one dataset.xml document
pub struct Ruleset<'a> {
    rules: &'a [Rule],
    document: &'a XmlDocument,
}

impl<'a> Ruleset<'a> {
    pub fn new(rules: &'a [Rule], document: &'a XmlDocument) -> Self {
        Self { rules, document }
    }

    pub fn nodes(&self, field: Field) -> Vec<&'a XmlElement> {
        let document = self.document;
        self.rules
            .iter()
            .filter(|r| r.field == field)
            .flat_map(|r| r.paths.iter())
            .flat_map(move |path| document.root.select(path))
            .collect()
    }

    /// Non-blank trimmed texts, duplicates removed
    pub fn texts(&self, field: Field) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for node in self.nodes(field) {
            let text = node.trimmed_text();
            if !text.is_empty() && !values.iter().any(|v| v == text) {
                values.push(text.to_string());
            }
        }
        values
    }

    pub fn first_text(&self, field: Field) -> Option<String> {
        self.texts(field).into_iter().next()
    }
}
